// SPDX-License-Identifier: MIT
//! Language service interface.
//!
//! A service is immutable once built and may be shared by any number of
//! sessions concurrently; nothing in this trait takes `&mut self`. Analysis
//! can be slow — implementations must poll the cancellation signal and bail
//! rather than complete unnecessary work after the client is gone.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cancel::CancelSignal;

/// Char-offset range inside the mirrored text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub length: usize,
}

impl Span {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }
}

/// One completion candidate, ordered best-first by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItem {
    pub display_text: String,
    /// Service-specific kind label (`"word"`, `"keyword"`, `"method"`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CompletionItem {
    pub fn new(display_text: impl Into<String>) -> Self {
        Self {
            display_text: display_text.into(),
            kind: None,
            description: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hint,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    pub span: Span,
}

/// Tooltip shown for a position; `None` from the service means nothing
/// applicable there (distinct from an error).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InfoTip {
    pub text: String,
    pub span: Span,
}

/// Pluggable language analysis behind the command handlers.
#[async_trait]
pub trait LanguageService: Send + Sync {
    /// Registry name this service was built for.
    fn name(&self) -> &str;

    /// Completion candidates for the text as it stands, cursor included.
    async fn completions(
        &self,
        text: &str,
        cursor: usize,
        cancel: &CancelSignal,
    ) -> anyhow::Result<Vec<CompletionItem>>;

    /// Full-document diagnostics (the slow-update pass).
    async fn diagnostics(
        &self,
        text: &str,
        cancel: &CancelSignal,
    ) -> anyhow::Result<Vec<Diagnostic>>;

    /// Tooltip for `position`, already bounds-checked by the handler.
    async fn info_tip(
        &self,
        text: &str,
        position: usize,
        cancel: &CancelSignal,
    ) -> anyhow::Result<Option<InfoTip>>;
}

/// Configuration a language factory builds a service from. Cache identity
/// is the `Arc` holding this value, not its contents — callers that want to
/// share one service instance must share the configuration object itself.
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    pub language: String,
    /// Language-specific settings, opaque to the core.
    pub settings: Value,
}

impl LanguageConfig {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            settings: Value::Null,
        }
    }

    pub fn with_settings(mut self, settings: Value) -> Self {
        self.settings = settings;
        self
    }
}
