// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::errors::ProtocolError;
use crate::extensions::SetOptionsFromClient;
use crate::ipc::dispatch::{CommandArg, CommandHandler};
use crate::ipc::results::{ResultSink, ServerResult};
use crate::session::Session;

/// `O` — apply `key=value` pairs and echo back exactly what was applied.
///
/// Keys the core does not recognize are offered to the configured hook as
/// one batch; keys neither recognized nor claimed are dropped and never
/// appear in the echo.
pub struct SetOptionsHandler {
    hook: Option<Arc<dyn SetOptionsFromClient>>,
}

impl SetOptionsHandler {
    pub fn new(hook: Option<Arc<dyn SetOptionsFromClient>>) -> Self {
        Self { hook }
    }
}

#[async_trait]
impl CommandHandler for SetOptionsHandler {
    fn id(&self) -> char {
        'O'
    }

    fn decode(&self, raw: &str) -> Result<CommandArg, ProtocolError> {
        let mut pairs = Vec::new();
        for pair in raw.split(',').filter(|pair| !pair.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(ProtocolError::MalformedArgument {
                    command: self.id(),
                    detail: format!("expected key=value, got {pair:?}"),
                });
            };
            pairs.push((key.to_string(), value.to_string()));
        }
        Ok(CommandArg::Options(pairs))
    }

    async fn execute(
        &self,
        arg: CommandArg,
        session: &mut Session,
        sink: &mut dyn ResultSink,
        _cancel: &CancelSignal,
    ) -> anyhow::Result<()> {
        let CommandArg::Options(pairs) = arg else {
            anyhow::bail!("SetOptions argument decoded to an unexpected shape");
        };

        let applied = session.apply_options(pairs, self.hook.as_deref());
        sink.send_result(ServerResult::OptionsEcho { options: applied })
            .await
    }
}
