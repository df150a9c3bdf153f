// SPDX-License-Identifier: MIT
//! Per-connection editing state.
//!
//! A `Session` is exclusively owned by its connection's worker task; the
//! dispatcher never runs two commands of one session concurrently, so no
//! internal locking is needed. The language binding is resolved once at
//! session creation and never rebound.

pub mod buffer;
pub mod self_debug;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::ProtocolError;
use crate::extensions::SetOptionsFromClient;
use crate::language::LanguageService;
use buffer::TextBuffer;
use self_debug::SelfDebugLog;

/// Opaque per-session state owned by extension hooks. The core never
/// inspects it.
pub type ExtensionState = HashMap<String, Value>;

// ─── Recognized options ──────────────────────────────────────────────────────

/// `optimize` option values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizeLevel {
    #[default]
    Debug,
    Release,
}

impl OptimizeLevel {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "debug" => Some(Self::Debug),
            "release" => Some(Self::Release),
            _ => None,
        }
    }
}

/// Session options the core statically recognizes. Everything else is
/// offered to the SetOptionsFromClient hook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub optimize: OptimizeLevel,
    /// Emit fresh diagnostics after every ReplaceText command.
    pub diagnostics_on_type: bool,
}

const OPTION_OPTIMIZE: &str = "optimize";
const OPTION_DIAGNOSTICS_ON_TYPE: &str = "diagnosticsOnType";

// ─── Session ─────────────────────────────────────────────────────────────────

pub struct Session {
    buffer: TextBuffer,
    cursor: usize,
    language: Arc<dyn LanguageService>,
    options: SessionOptions,
    extension_state: ExtensionState,
    self_debug: Option<SelfDebugLog>,
    last_change_reason: Option<String>,
}

impl Session {
    pub fn new(
        language: Arc<dyn LanguageService>,
        defaults: SessionOptions,
        self_debug_enabled: bool,
    ) -> Self {
        Self {
            buffer: TextBuffer::new(),
            cursor: 0,
            language,
            options: defaults,
            extension_state: ExtensionState::new(),
            self_debug: self_debug_enabled.then(SelfDebugLog::new),
            last_change_reason: None,
        }
    }

    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn text_length(&self) -> usize {
        self.buffer.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn language(&self) -> &Arc<dyn LanguageService> {
        &self.language
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn extension_state_mut(&mut self) -> &mut ExtensionState {
        &mut self.extension_state
    }

    pub fn last_change_reason(&self) -> Option<&str> {
        self.last_change_reason.as_deref()
    }

    // ─── Mutation primitives ─────────────────────────────────────────────────

    /// The sole core mutation primitive: replace `[start, start + length)`
    /// with `new_text`, then clamp the cursor into the new bounds. Bounds
    /// are checked before any mutation.
    pub fn replace_text(
        &mut self,
        start: usize,
        length: usize,
        new_text: &str,
        new_cursor: usize,
        reason: &str,
    ) -> Result<(), ProtocolError> {
        self.buffer.replace_range(start, length, new_text)?;
        self.cursor = new_cursor.min(self.buffer.len());
        if reason.is_empty() {
            self.last_change_reason = None;
        } else {
            self.last_change_reason = Some(reason.to_string());
        }
        debug!(
            start,
            length,
            new_len = self.buffer.len(),
            cursor = self.cursor,
            reason,
            "text replaced"
        );
        debug_assert!(self.cursor <= self.buffer.len());
        Ok(())
    }

    /// Single-character typing: a zero-length insert at the cursor, cursor
    /// advanced past the new char.
    pub fn type_char(&mut self, ch: char) -> Result<(), ProtocolError> {
        let at = self.cursor;
        self.replace_text(at, 0, ch.encode_utf8(&mut [0u8; 4]), at + 1, "typechar")
    }

    pub fn set_cursor(&mut self, position: usize) -> Result<(), ProtocolError> {
        if position > self.buffer.len() {
            return Err(ProtocolError::out_of_bounds(
                position,
                position,
                self.buffer.len(),
            ));
        }
        self.cursor = position;
        Ok(())
    }

    // ─── Options ─────────────────────────────────────────────────────────────

    /// Apply a batch of client options. Statically recognized keys are
    /// parsed by kind (enum, bool); the remainder is offered as one batch
    /// to the hook, which returns the subset it applied. The echo is the
    /// union of both applied subsets — never the full requested set.
    pub fn apply_options(
        &mut self,
        requested: Vec<(String, String)>,
        hook: Option<&dyn SetOptionsFromClient>,
    ) -> BTreeMap<String, String> {
        let mut applied = BTreeMap::new();
        let mut unrecognized = BTreeMap::new();

        for (key, value) in requested {
            if key == OPTION_OPTIMIZE {
                match OptimizeLevel::parse(&value) {
                    Some(level) => {
                        self.options.optimize = level;
                        applied.insert(key, value);
                    }
                    None => warn!(value = %value, "invalid optimize value, option dropped"),
                }
            } else if key == OPTION_DIAGNOSTICS_ON_TYPE {
                match value.parse::<bool>() {
                    Ok(flag) => {
                        self.options.diagnostics_on_type = flag;
                        applied.insert(key, value);
                    }
                    Err(_) => {
                        warn!(value = %value, "invalid diagnosticsOnType value, option dropped");
                    }
                }
            } else {
                unrecognized.insert(key, value);
            }
        }

        if let Some(hook) = hook {
            if !unrecognized.is_empty() {
                let claimed = hook.try_apply(&mut self.extension_state, &unrecognized);
                for key in claimed {
                    if let Some(value) = unrecognized.get(&key) {
                        applied.insert(key, value.clone());
                    }
                }
            }
        }

        applied
    }

    // ─── Self-debug ──────────────────────────────────────────────────────────

    pub fn self_debug_enabled(&self) -> bool {
        self.self_debug.is_some()
    }

    /// Record a processed command in the self-debug ring, if enabled.
    pub fn record_command(&mut self, command: char) {
        if self.self_debug.is_none() {
            return;
        }
        let cursor = self.cursor;
        let len = self.buffer.len();
        let excerpt = self.buffer.excerpt(SelfDebugLog::excerpt_chars());
        if let Some(log) = self.self_debug.as_mut() {
            log.record(command, cursor, len, excerpt);
        }
    }

    pub fn self_debug_entries(&self) -> Vec<self_debug::SelfDebugEntry> {
        self.self_debug
            .as_ref()
            .map(SelfDebugLog::entries)
            .unwrap_or_default()
    }
}
