// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::errors::ProtocolError;
use crate::ipc::dispatch::{decode_position, CommandArg, CommandHandler};
use crate::ipc::results::ResultSink;
use crate::session::Session;

/// `M` — move the cursor. Fire-and-forget: no result on success.
pub struct MoveCursorHandler;

#[async_trait]
impl CommandHandler for MoveCursorHandler {
    fn id(&self) -> char {
        'M'
    }

    fn decode(&self, raw: &str) -> Result<CommandArg, ProtocolError> {
        decode_position(self.id(), raw).map(CommandArg::Position)
    }

    async fn execute(
        &self,
        arg: CommandArg,
        session: &mut Session,
        _sink: &mut dyn ResultSink,
        _cancel: &CancelSignal,
    ) -> anyhow::Result<()> {
        let CommandArg::Position(position) = arg else {
            anyhow::bail!("MoveCursor argument decoded to an unexpected shape");
        };
        session.set_cursor(position)?;
        Ok(())
    }
}
