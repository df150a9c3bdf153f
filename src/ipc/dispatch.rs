// SPDX-License-Identifier: MIT
//! Command dispatcher.
//!
//! Routing is a fixed id → handler table built once at startup; there is no
//! runtime registration. Execution per command: resolve the handler, decode
//! the raw argument with the handler's grammar (a decode failure never
//! invokes the handler), invoke, and intercept any failure at this boundary
//! — the error becomes an `error` result, the exception logger sees it, and
//! the session keeps whatever state the handler reached (handlers order
//! their mutations so a partial failure leaves a usable session).
//!
//! The dispatcher itself is only ever called from a session's single worker
//! task, which is what makes per-session serialization structural.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cancel::CancelSignal;
use crate::config::ServerOptions;
use crate::errors::ProtocolError;
use crate::extensions::ExceptionLogger;
use crate::session::Session;

use super::handlers;
use super::results::{ResultSink, ServerResult};

/// A command argument after grammar decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandArg {
    None,
    Char(char),
    Position(usize),
    Replace {
        start: usize,
        length: usize,
        new_cursor: usize,
        reason: String,
        text: String,
    },
    Options(Vec<(String, String)>),
}

/// The logic bound to one command identifier.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Wire identifier, the first char of an inbound frame.
    fn id(&self) -> char;

    /// Decode the raw argument. Must not touch any session state.
    fn decode(&self, raw: &str) -> Result<CommandArg, ProtocolError>;

    async fn execute(
        &self,
        arg: CommandArg,
        session: &mut Session,
        sink: &mut dyn ResultSink,
        cancel: &CancelSignal,
    ) -> anyhow::Result<()>;
}

pub struct Dispatcher {
    handlers: HashMap<char, Box<dyn CommandHandler>>,
    exception_logger: Option<Arc<dyn ExceptionLogger>>,
    include_exception_details: bool,
}

impl Dispatcher {
    /// Build the fixed handler table from the configured options.
    pub fn new(options: &ServerOptions) -> Self {
        let table: Vec<Box<dyn CommandHandler>> = vec![
            Box::new(handlers::type_char::TypeCharHandler),
            Box::new(handlers::replace_text::ReplaceTextHandler),
            Box::new(handlers::move_cursor::MoveCursorHandler),
            Box::new(handlers::set_options::SetOptionsHandler::new(
                options.set_options_from_client.clone(),
            )),
            Box::new(handlers::slow_update::SlowUpdateHandler::new(
                options.slow_update.clone(),
            )),
            Box::new(handlers::info_tip::InfoTipHandler),
            Box::new(handlers::self_debug::SelfDebugHandler),
        ];

        let mut map = HashMap::with_capacity(table.len());
        for handler in table {
            let replaced = map.insert(handler.id(), handler);
            debug_assert!(replaced.is_none(), "duplicate command id in handler table");
        }

        Self {
            handlers: map,
            exception_logger: options.exception_logger.clone(),
            include_exception_details: options.include_exception_details,
        }
    }

    /// Execute one inbound command frame against `session`.
    ///
    /// Protocol failures are absorbed into an `error` result; the returned
    /// `Err` only signals that the sink itself is gone (connection closed),
    /// which stops the session worker.
    pub async fn execute(
        &self,
        frame: &str,
        session: &mut Session,
        sink: &mut dyn ResultSink,
        cancel: &CancelSignal,
    ) -> anyhow::Result<()> {
        let Some(command) = frame.chars().next() else {
            return self
                .intercept(ProtocolError::EmptyCommand.into(), session, sink)
                .await;
        };
        let raw = &frame[command.len_utf8()..];

        let Some(handler) = self.handlers.get(&command) else {
            // Unknown id: the session is not touched, byte-for-byte.
            return self
                .intercept(ProtocolError::UnknownCommand(command).into(), session, sink)
                .await;
        };

        let arg = match handler.decode(raw) {
            Ok(arg) => arg,
            Err(error) => return self.intercept(error.into(), session, sink).await,
        };

        debug!(command = %command, cursor = session.cursor(), "dispatch");
        let outcome = handler.execute(arg, session, sink, cancel).await;
        session.record_command(command);

        match outcome {
            Ok(()) => Ok(()),
            Err(error) => self.intercept(error, session, sink).await,
        }
    }

    async fn intercept(
        &self,
        error: anyhow::Error,
        session: &Session,
        sink: &mut dyn ResultSink,
    ) -> anyhow::Result<()> {
        warn!(error = %error, "command failed");
        if let Some(logger) = &self.exception_logger {
            logger.log_exception(&error, session);
        }
        let message = error_message(&error, self.include_exception_details);
        sink.send_result(ServerResult::Error { message }).await
    }
}

/// Protocol errors carry well-defined, client-safe messages; anything else
/// is an internal failure whose detail is disclosed only when configured.
fn error_message(error: &anyhow::Error, include_details: bool) -> String {
    if let Some(protocol) = error.downcast_ref::<ProtocolError>() {
        return protocol.to_string();
    }
    if include_details {
        format!("{error:#}")
    } else {
        "internal error".to_string()
    }
}

/// Shared decode helper: a decimal char position.
pub(crate) fn decode_position(command: char, raw: &str) -> Result<usize, ProtocolError> {
    raw.parse::<usize>()
        .map_err(|_| ProtocolError::MalformedArgument {
            command,
            detail: format!("expected a decimal position, got {raw:?}"),
        })
}

/// Shared decode helper: the argument must be empty.
pub(crate) fn decode_empty(command: char, raw: &str) -> Result<CommandArg, ProtocolError> {
    if raw.is_empty() {
        Ok(CommandArg::None)
    } else {
        Err(ProtocolError::MalformedArgument {
            command,
            detail: "expected no argument".to_string(),
        })
    }
}
