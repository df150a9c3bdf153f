// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::errors::ProtocolError;
use crate::ipc::dispatch::{CommandArg, CommandHandler};
use crate::ipc::results::{ResultSink, ServerResult};
use crate::session::Session;

/// `R` — the core edit primitive: `start:length:newCursor:reason:text`.
///
/// The text field is last so it may contain the delimiter. No result on
/// success (the client already knows what it sent), unless the session's
/// `diagnosticsOnType` option asks for a fresh diagnostics pass.
pub struct ReplaceTextHandler;

#[async_trait]
impl CommandHandler for ReplaceTextHandler {
    fn id(&self) -> char {
        'R'
    }

    fn decode(&self, raw: &str) -> Result<CommandArg, ProtocolError> {
        let malformed = |detail: String| ProtocolError::MalformedArgument {
            command: 'R',
            detail,
        };

        let mut fields = raw.splitn(5, ':');
        let mut next = |name: &str| {
            fields
                .next()
                .ok_or_else(|| malformed(format!("missing field {name}")))
        };

        let start = next("start")?;
        let length = next("length")?;
        let new_cursor = next("newCursor")?;
        let reason = next("reason")?.to_string();
        let text = next("text")?.to_string();

        let parse = |name: &str, value: &str| {
            value
                .parse::<usize>()
                .map_err(|_| malformed(format!("field {name} is not a decimal integer: {value:?}")))
        };

        Ok(CommandArg::Replace {
            start: parse("start", start)?,
            length: parse("length", length)?,
            new_cursor: parse("newCursor", new_cursor)?,
            reason,
            text,
        })
    }

    async fn execute(
        &self,
        arg: CommandArg,
        session: &mut Session,
        sink: &mut dyn ResultSink,
        cancel: &CancelSignal,
    ) -> anyhow::Result<()> {
        let CommandArg::Replace {
            start,
            length,
            new_cursor,
            reason,
            text,
        } = arg
        else {
            anyhow::bail!("ReplaceText argument decoded to an unexpected shape");
        };

        session.replace_text(start, length, &text, new_cursor, &reason)?;

        if session.options().diagnostics_on_type {
            let language = session.language().clone();
            let diagnostics = language.diagnostics(&session.text(), cancel).await?;
            sink.send_result(ServerResult::SlowUpdate {
                diagnostics,
                x: None,
            })
            .await?;
        }
        Ok(())
    }
}
