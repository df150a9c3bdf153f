// SPDX-License-Identifier: MIT
//! Protocol error taxonomy.
//!
//! Configuration-time failures (`UnknownLanguage`, duplicate registration)
//! are fatal to session/service construction. Per-command failures are
//! recovered at the dispatcher boundary and turned into an `error` result;
//! the connection stays up.

use thiserror::Error;

/// Typed failures raised while decoding or executing a command.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// No handler is registered for the command identifier.
    #[error("unknown command '{0}'")]
    UnknownCommand(char),

    /// A frame arrived with no command identifier at all.
    #[error("empty command frame")]
    EmptyCommand,

    /// The raw argument did not match the handler's grammar.
    #[error("malformed argument for command '{command}': {detail}")]
    MalformedArgument { command: char, detail: String },

    /// A position or range fell outside the current text bounds.
    #[error("range out of bounds: {start}..{end} (text length {len})")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    /// The requested language is not present in the registry.
    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    /// A language name was registered twice at configuration time.
    #[error("language already registered: {0}")]
    DuplicateLanguage(String),
}

impl ProtocolError {
    /// Convenience constructor used by bounds checks.
    pub fn out_of_bounds(start: usize, end: usize, len: usize) -> Self {
        Self::RangeOutOfBounds { start, end, len }
    }
}
