// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::errors::ProtocolError;
use crate::ipc::dispatch::{decode_position, CommandArg, CommandHandler};
use crate::ipc::results::{ResultSink, ServerResult};
use crate::session::Session;

/// `I` — tooltip for a position. The bounds check runs before the language
/// query so an out-of-range request emits no partial result; a language
/// with nothing to show emits nothing at all.
pub struct InfoTipHandler;

#[async_trait]
impl CommandHandler for InfoTipHandler {
    fn id(&self) -> char {
        'I'
    }

    fn decode(&self, raw: &str) -> Result<CommandArg, ProtocolError> {
        decode_position(self.id(), raw).map(CommandArg::Position)
    }

    async fn execute(
        &self,
        arg: CommandArg,
        session: &mut Session,
        sink: &mut dyn ResultSink,
        cancel: &CancelSignal,
    ) -> anyhow::Result<()> {
        let CommandArg::Position(position) = arg else {
            anyhow::bail!("RequestInfoTip argument decoded to an unexpected shape");
        };

        let length = session.text_length();
        if position > length {
            return Err(ProtocolError::out_of_bounds(position, position, length).into());
        }

        let language = session.language().clone();
        if let Some(tip) = language.info_tip(&session.text(), position, cancel).await? {
            sink.send_result(ServerResult::InfoTip {
                text: tip.text,
                span: tip.span,
            })
            .await?;
        }
        Ok(())
    }
}
