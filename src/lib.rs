// SPDX-License-Identifier: MIT
//! Glass — live mirror-editing daemon.
//!
//! Each WebSocket connection owns a server-side mirror of one editor
//! buffer. Single-character command frames mutate the mirror or query the
//! session's language service; tagged JSON results flow back on the same
//! socket. See `ipc` for the protocol, `session` for the state model, and
//! `language` for the pluggable analysis backends.

pub mod cancel;
pub mod config;
pub mod errors;
pub mod extensions;
pub mod ipc;
pub mod language;
pub mod session;
pub mod testing;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context as _;

use config::{DaemonConfig, ServerOptions};
use ipc::dispatch::Dispatcher;
use language::{LanguageConfig, ServiceCache};
use session::Session;

/// Shared application state handed to every connection task.
pub struct AppContext {
    pub config: Arc<DaemonConfig>,
    pub options: Arc<ServerOptions>,
    pub dispatcher: Arc<Dispatcher>,
    pub service_cache: Arc<ServiceCache>,
    /// One configuration object per registered language, created once at
    /// startup — sharing these objects is what makes sessions share the
    /// cached service instances built from them.
    pub language_configs: HashMap<String, Arc<LanguageConfig>>,
    pub active_sessions: Arc<AtomicUsize>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    /// Wire the daemon together. Fails fast on configuration errors — an
    /// unresolvable default language must never surface per-connection.
    pub fn new(config: DaemonConfig, options: ServerOptions) -> anyhow::Result<Arc<Self>> {
        let mut language_configs = HashMap::new();
        for name in options.registry.names() {
            let settings = match config.languages.get(name) {
                Some(section) => serde_json::to_value(&section.settings)
                    .with_context(|| format!("converting settings for language {name}"))?,
                None => serde_json::Value::Null,
            };
            language_configs.insert(
                name.to_string(),
                Arc::new(LanguageConfig::new(name).with_settings(settings)),
            );
        }

        options
            .registry
            .resolve(&config.default_language)
            .with_context(|| {
                format!(
                    "default language {:?} is not registered",
                    config.default_language
                )
            })?;

        let dispatcher = Arc::new(Dispatcher::new(&options));
        Ok(Arc::new(Self {
            config: Arc::new(config),
            options: Arc::new(options),
            dispatcher,
            service_cache: Arc::new(ServiceCache::new()),
            language_configs,
            active_sessions: Arc::new(AtomicUsize::new(0)),
            started_at: std::time::Instant::now(),
        }))
    }

    pub fn active_session_count(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }

    /// New session bound to the configured default language.
    pub async fn create_session(&self) -> anyhow::Result<Session> {
        self.create_session_for(&self.config.default_language).await
    }

    /// New session bound to `language`. The service instance is shared with
    /// every other session referencing the same configuration object.
    pub async fn create_session_for(&self, language: &str) -> anyhow::Result<Session> {
        let factory = self.options.registry.resolve(language)?;
        let language_config = self
            .language_configs
            .get(language)
            .ok_or_else(|| errors::ProtocolError::UnknownLanguage(language.to_string()))?;
        let service = self
            .service_cache
            .get_or_build(&factory, language_config)
            .await?;
        Ok(Session::new(
            service,
            self.options.session_defaults,
            self.options.self_debug_enabled,
        ))
    }
}
