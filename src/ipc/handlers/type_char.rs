// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::errors::ProtocolError;
use crate::ipc::dispatch::{CommandArg, CommandHandler};
use crate::ipc::results::{ResultSink, ServerResult};
use crate::session::Session;

/// `C` — insert one char at the cursor, advance it, and answer with the
/// language's completion candidates for the new state.
pub struct TypeCharHandler;

#[async_trait]
impl CommandHandler for TypeCharHandler {
    fn id(&self) -> char {
        'C'
    }

    fn decode(&self, raw: &str) -> Result<CommandArg, ProtocolError> {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(CommandArg::Char(ch)),
            _ => Err(ProtocolError::MalformedArgument {
                command: self.id(),
                detail: format!("expected exactly one char, got {raw:?}"),
            }),
        }
    }

    async fn execute(
        &self,
        arg: CommandArg,
        session: &mut Session,
        sink: &mut dyn ResultSink,
        cancel: &CancelSignal,
    ) -> anyhow::Result<()> {
        let CommandArg::Char(ch) = arg else {
            anyhow::bail!("TypeChar argument decoded to an unexpected shape");
        };

        session.type_char(ch)?;

        let language = session.language().clone();
        let completions = language
            .completions(&session.text(), session.cursor(), cancel)
            .await?;
        sink.send_result(ServerResult::Completions { completions })
            .await
    }
}
