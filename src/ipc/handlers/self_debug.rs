// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::errors::ProtocolError;
use crate::ipc::dispatch::{decode_empty, CommandArg, CommandHandler};
use crate::ipc::results::{ResultSink, ServerResult};
use crate::session::Session;

/// `Y` — dump the session's self-debug ring. Emits nothing when self-debug
/// is disabled.
pub struct SelfDebugHandler;

#[async_trait]
impl CommandHandler for SelfDebugHandler {
    fn id(&self) -> char {
        'Y'
    }

    fn decode(&self, raw: &str) -> Result<CommandArg, ProtocolError> {
        decode_empty(self.id(), raw)
    }

    async fn execute(
        &self,
        _arg: CommandArg,
        session: &mut Session,
        sink: &mut dyn ResultSink,
        _cancel: &CancelSignal,
    ) -> anyhow::Result<()> {
        if !session.self_debug_enabled() {
            return Ok(());
        }
        sink.send_result(ServerResult::SelfDebug {
            log: session.self_debug_entries(),
        })
        .await
    }
}
