// SPDX-License-Identifier: MIT
//! Daemon configuration.
//!
//! Two layers: `DaemonConfig` is what the TOML file and CLI flags can
//! express (transport, limits, per-language sections); `ServerOptions` is
//! the full programmatic surface, including the extension hooks that can
//! only be supplied in code by whoever embeds the server.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::extensions::{ExceptionLogger, SetOptionsFromClient, SlowUpdateExtension};
use crate::language::{LanguageRegistry, TEXT_LANGUAGE};
use crate::session::SessionOptions;

const DEFAULT_PORT: u16 = 4380;
const DEFAULT_MAX_SESSIONS: usize = 0; // unlimited

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── DaemonConfig ────────────────────────────────────────────────────────────

/// Per-language section (`[languages.<name>]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LanguageSection {
    /// `false` removes the language from the registry entirely.
    pub enabled: bool,
    /// Language-specific settings, passed opaquely to the factory.
    pub settings: toml::Table,
}

impl Default for LanguageSection {
    fn default() -> Self {
        Self {
            enabled: true,
            settings: toml::Table::new(),
        }
    }
}

/// File/CLI-configurable daemon settings (`config.toml`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// WebSocket server port.
    pub port: u16,
    /// Bind address (use `0.0.0.0` for LAN access).
    pub bind_address: String,
    /// Language bound to every new session.
    pub default_language: String,
    /// Maximum concurrent sessions (0 = unlimited).
    pub max_sessions: usize,
    /// Whether error results carry messages/chains. Default: minimal
    /// disclosure.
    pub include_exception_details: bool,
    /// Per-session command ring for bug reports. Might reduce throughput.
    pub self_debug_enabled: bool,
    pub languages: HashMap<String, LanguageSection>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: default_bind_address(),
            default_language: TEXT_LANGUAGE.to_string(),
            max_sessions: DEFAULT_MAX_SESSIONS,
            include_exception_details: false,
            self_debug_enabled: false,
            languages: HashMap::new(),
        }
    }
}

impl DaemonConfig {
    /// Load from a TOML file, or fall back to defaults when no path is
    /// given. A present-but-unreadable file is an error, not a fallback.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            info!("no config file given, using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }
}

// ─── ServerOptions ───────────────────────────────────────────────────────────

/// The full server configuration surface. Hooks default to absent (no-op);
/// the registry starts with the built-in languages.
pub struct ServerOptions {
    pub registry: LanguageRegistry,
    pub include_exception_details: bool,
    pub self_debug_enabled: bool,
    pub session_defaults: SessionOptions,
    pub set_options_from_client: Option<Arc<dyn SetOptionsFromClient>>,
    pub slow_update: Option<Arc<dyn SlowUpdateExtension>>,
    pub exception_logger: Option<Arc<dyn ExceptionLogger>>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            registry: LanguageRegistry::with_defaults(),
            include_exception_details: false,
            self_debug_enabled: false,
            session_defaults: SessionOptions::default(),
            set_options_from_client: None,
            slow_update: None,
            exception_logger: None,
        }
    }
}

impl ServerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Carry the file-configurable flags over and apply per-language
    /// `enabled = false` removals.
    pub fn from_daemon_config(config: &DaemonConfig) -> Self {
        let mut options = Self::new();
        options.include_exception_details = config.include_exception_details;
        options.self_debug_enabled = config.self_debug_enabled;
        for (name, section) in &config.languages {
            if !section.enabled {
                options.registry.remove(name);
            }
        }
        options
    }

    pub fn with_set_options_from_client(
        mut self,
        hook: Arc<dyn SetOptionsFromClient>,
    ) -> Self {
        self.set_options_from_client = Some(hook);
        self
    }

    pub fn with_slow_update(mut self, hook: Arc<dyn SlowUpdateExtension>) -> Self {
        self.slow_update = Some(hook);
        self
    }

    pub fn with_exception_logger(mut self, hook: Arc<dyn ExceptionLogger>) -> Self {
        self.exception_logger = Some(hook);
        self
    }

    pub fn with_exception_details(mut self, include: bool) -> Self {
        self.include_exception_details = include;
        self
    }

    pub fn with_self_debug(mut self, enabled: bool) -> Self {
        self.self_debug_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_loopback() {
        let config = DaemonConfig::default();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.default_language, "text");
        assert!(!config.include_exception_details);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: DaemonConfig = toml::from_str(
            r#"
            port = 9001

            [languages.text]
            settings = { minWordLength = 2 }
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.bind_address, "127.0.0.1");
        let section = &config.languages["text"];
        assert!(section.enabled);
        assert_eq!(section.settings["minWordLength"].as_integer(), Some(2));
    }

    #[test]
    fn disabled_language_is_removed_from_registry() {
        let config: DaemonConfig = toml::from_str(
            r#"
            [languages.text]
            enabled = false
            "#,
        )
        .unwrap();
        let options = ServerOptions::from_daemon_config(&config);
        assert!(options.registry.resolve("text").is_err());
    }
}
