// SPDX-License-Identifier: MIT
// End-to-end command flows through the real dispatcher, no socket.

use glassd::ipc::results::ServerResult;
use glassd::language::Span;
use glassd::config::ServerOptions;
use glassd::testing::TestDriver;

// ─── TypeChar ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn type_char_inserts_at_cursor_and_advances() {
    let mut driver = TestDriver::new().await.unwrap();
    driver.set_text("class C{}").unwrap();

    driver.send_type_chars("x").await.unwrap();

    assert_eq!(driver.session().text(), "xclass C{}");
    assert_eq!(driver.session().cursor(), 1);
}

#[tokio::test]
async fn type_char_answers_with_completions() {
    let mut driver = TestDriver::new().await.unwrap();
    driver.set_text_with_cursor("mirror mirage mi|").unwrap();

    driver.send_type_chars("r").await.unwrap();

    match driver.last_result().unwrap() {
        ServerResult::Completions { completions } => {
            let names: Vec<&str> = completions
                .iter()
                .map(|c| c.display_text.as_str())
                .collect();
            assert_eq!(names, vec!["mirage", "mirror"]);
        }
        other => panic!("expected completions, got {other:?}"),
    }
}

// ─── ReplaceText ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn replace_text_splices_range_and_sets_cursor() {
    let mut driver = TestDriver::new().await.unwrap();
    driver.set_text("abcdef").unwrap();

    driver
        .send_replace_text(1, 2, 4, "edit", "XYZ")
        .await
        .unwrap();

    assert_eq!(driver.session().text(), "aXYZdef");
    assert_eq!(driver.session().cursor(), 4);
    assert_eq!(driver.session().last_change_reason(), Some("edit"));
    // Success is silent — the client already knows what it sent.
    assert!(driver.results().is_empty());
}

#[tokio::test]
async fn replace_text_clamps_cursor_into_new_bounds() {
    let mut driver = TestDriver::new().await.unwrap();
    driver.send_replace_text(0, 0, 999, "paste", "hi").await.unwrap();
    assert_eq!(driver.session().cursor(), 2);
}

#[tokio::test]
async fn replacement_text_may_contain_the_delimiter() {
    let mut driver = TestDriver::new().await.unwrap();
    driver
        .send_replace_text(0, 0, 0, "paste", "a:b:c")
        .await
        .unwrap();
    assert_eq!(driver.session().text(), "a:b:c");
}

#[tokio::test]
async fn back_to_back_commands_apply_in_order() {
    let mut driver = TestDriver::new().await.unwrap();
    driver.set_text("abcdef").unwrap();

    driver.send_replace_text(0, 3, 0, "first", "X").await.unwrap();
    driver.send_replace_text(1, 2, 0, "second", "YY").await.unwrap();

    // "abcdef" → "Xdef" → "XYYf": strictly sequential application.
    assert_eq!(driver.session().text(), "XYYf");
}

// ─── MoveCursor ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn move_cursor_is_silent_and_bounds_checked() {
    let mut driver = TestDriver::new().await.unwrap();
    driver.set_text("abc").unwrap();

    driver.send('M', "3").await.unwrap();
    assert_eq!(driver.session().cursor(), 3);
    assert!(driver.results().is_empty());

    driver.send('M', "4").await.unwrap();
    assert!(matches!(
        driver.last_result().unwrap(),
        ServerResult::Error { .. }
    ));
    assert_eq!(driver.session().cursor(), 3);
}

// ─── RequestInfoTip ──────────────────────────────────────────────────────────

#[tokio::test]
async fn info_tip_shows_word_under_position() {
    let mut driver = TestDriver::new().await.unwrap();
    driver.set_text("count the count").unwrap();

    driver.send_info_tip(1).await.unwrap();

    match driver.last_result().unwrap() {
        ServerResult::InfoTip { text, span } => {
            assert!(text.contains("count"));
            assert!(text.contains("2 occurrence"));
            assert_eq!(*span, Span::new(0, 5));
        }
        other => panic!("expected info tip, got {other:?}"),
    }
}

#[tokio::test]
async fn info_tip_absent_is_not_an_error() {
    let mut driver = TestDriver::new().await.unwrap();
    driver.set_text("count the count").unwrap();

    driver.send_info_tip(5).await.unwrap();

    assert!(driver.results().is_empty());
}

#[tokio::test]
async fn info_tip_out_of_bounds_emits_no_partial_result() {
    let mut driver = TestDriver::new().await.unwrap();
    driver.set_text("abc").unwrap();

    driver.send_info_tip(7).await.unwrap();

    assert_eq!(driver.results().len(), 1);
    match driver.last_result().unwrap() {
        ServerResult::Error { message } => assert!(message.contains("range out of bounds")),
        other => panic!("expected error, got {other:?}"),
    }
}

// ─── SlowUpdate ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn slow_update_reports_diagnostics() {
    let mut driver = TestDriver::new().await.unwrap();
    driver.set_text("fn main( {}").unwrap();

    driver.send_slow_update().await.unwrap();

    match driver.last_result().unwrap() {
        ServerResult::SlowUpdate { diagnostics, x } => {
            assert_eq!(diagnostics.len(), 1);
            assert!(diagnostics[0].message.contains("unclosed"));
            assert_eq!(diagnostics[0].span, Span::new(7, 1));
            assert!(x.is_none());
        }
        other => panic!("expected slow update, got {other:?}"),
    }
}

// ─── Self-debug ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn self_debug_dumps_command_ring_when_enabled() {
    let options = ServerOptions::default().with_self_debug(true);
    let mut driver = TestDriver::with_options(options).await.unwrap();

    driver.send_type_chars("ab").await.unwrap();
    driver.send('Y', "").await.unwrap();

    match driver.last_result().unwrap() {
        ServerResult::SelfDebug { log } => {
            // The dump itself is recorded after it is emitted.
            assert_eq!(log.len(), 2);
            assert!(log.iter().all(|entry| entry.command == "C"));
            assert_eq!(log[1].text_excerpt, "ab");
        }
        other => panic!("expected self-debug dump, got {other:?}"),
    }
}

#[tokio::test]
async fn self_debug_is_silent_when_disabled() {
    let mut driver = TestDriver::new().await.unwrap();
    driver.send('Y', "").await.unwrap();
    assert!(driver.results().is_empty());
}
