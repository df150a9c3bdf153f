// SPDX-License-Identifier: MIT
// Language plumbing: registry, shared service instances, settings, hooks.

use std::sync::Arc;

use async_trait::async_trait;
use glassd::cancel::CancelSignal;
use glassd::config::{DaemonConfig, ServerOptions};
use glassd::extensions::SlowUpdateExtension;
use glassd::ipc::results::ServerResult;
use glassd::language::Diagnostic;
use glassd::session::Session;
use glassd::testing::TestDriver;
use glassd::AppContext;

// ─── Registry / cache ────────────────────────────────────────────────────────

#[tokio::test]
async fn sessions_share_one_service_instance_per_config() {
    let ctx = AppContext::new(DaemonConfig::default(), ServerOptions::default()).unwrap();

    let first = ctx.create_session().await.unwrap();
    let second = ctx.create_session().await.unwrap();

    assert!(Arc::ptr_eq(first.language(), second.language()));
    assert_eq!(ctx.service_cache.len().await, 1);
}

#[tokio::test]
async fn unknown_default_language_is_fatal_at_startup() {
    let config = DaemonConfig {
        default_language: "cobol".to_string(),
        ..DaemonConfig::default()
    };
    assert!(AppContext::new(config, ServerOptions::default()).is_err());
}

#[tokio::test]
async fn disabling_the_default_language_is_fatal_at_startup() {
    let config: DaemonConfig = toml::from_str(
        r#"
        [languages.text]
        enabled = false
        "#,
    )
    .unwrap();
    let options = ServerOptions::from_daemon_config(&config);
    assert!(AppContext::new(config, options).is_err());
}

#[tokio::test]
async fn language_settings_reach_the_factory() {
    // minWordLength below the default makes two-char words complete.
    let config: DaemonConfig = toml::from_str(
        r#"
        [languages.text]
        settings = { minWordLength = 2 }
        "#,
    )
    .unwrap();
    let options = ServerOptions::from_daemon_config(&config);
    let mut tuned = TestDriver::with_config(config, options).await.unwrap();
    tuned.set_text_with_cursor("go gap |").unwrap();
    tuned.send_type_chars("g").await.unwrap();

    let mut standard = TestDriver::new().await.unwrap();
    standard.set_text_with_cursor("go gap |").unwrap();
    standard.send_type_chars("g").await.unwrap();

    let names = |result: &ServerResult| match result {
        ServerResult::Completions { completions } => completions
            .iter()
            .map(|c| c.display_text.clone())
            .collect::<Vec<_>>(),
        other => panic!("expected completions, got {other:?}"),
    };
    assert_eq!(names(tuned.last_result().unwrap()), vec!["gap", "go"]);
    assert_eq!(names(standard.last_result().unwrap()), vec!["gap"]);
}

// ─── Slow-update hook ────────────────────────────────────────────────────────

struct RevisionStamp;

#[async_trait]
impl SlowUpdateExtension for RevisionStamp {
    async fn process(
        &self,
        _session: &mut Session,
        _diagnostics: &mut Vec<Diagnostic>,
        _cancel: &CancelSignal,
    ) -> anyhow::Result<Option<serde_json::Value>> {
        Ok(Some(serde_json::json!({ "revision": 7 })))
    }
}

#[tokio::test]
async fn slow_update_hook_payload_rides_along() {
    let options = ServerOptions::default().with_slow_update(Arc::new(RevisionStamp));
    let mut driver = TestDriver::with_options(options).await.unwrap();

    driver.send_slow_update().await.unwrap();

    match driver.last_result().unwrap() {
        ServerResult::SlowUpdate { x, .. } => {
            assert_eq!(x.as_ref().unwrap()["revision"], 7);
        }
        other => panic!("expected slow update, got {other:?}"),
    }
}

// ─── Cancellation ────────────────────────────────────────────────────────────

#[tokio::test]
async fn cancelled_command_bails_instead_of_finishing() {
    let mut driver = TestDriver::new().await.unwrap();
    driver.set_text("(((").unwrap();
    driver.cancel_signal().cancel();

    driver.send_slow_update().await.unwrap();

    assert!(matches!(
        driver.last_result().unwrap(),
        ServerResult::Error { .. }
    ));
}
