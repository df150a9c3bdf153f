// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::errors::ProtocolError;
use crate::extensions::SlowUpdateExtension;
use crate::ipc::dispatch::{decode_empty, CommandArg, CommandHandler};
use crate::ipc::results::{ResultSink, ServerResult};
use crate::session::Session;

/// `U` — the full, potentially expensive re-analysis pass: fresh
/// diagnostics, optionally augmented by the slow-update hook's payload.
pub struct SlowUpdateHandler {
    hook: Option<Arc<dyn SlowUpdateExtension>>,
}

impl SlowUpdateHandler {
    pub fn new(hook: Option<Arc<dyn SlowUpdateExtension>>) -> Self {
        Self { hook }
    }
}

#[async_trait]
impl CommandHandler for SlowUpdateHandler {
    fn id(&self) -> char {
        'U'
    }

    fn decode(&self, raw: &str) -> Result<CommandArg, ProtocolError> {
        decode_empty(self.id(), raw)
    }

    async fn execute(
        &self,
        _arg: CommandArg,
        session: &mut Session,
        sink: &mut dyn ResultSink,
        cancel: &CancelSignal,
    ) -> anyhow::Result<()> {
        let language = session.language().clone();
        let mut diagnostics = language.diagnostics(&session.text(), cancel).await?;

        let x = match &self.hook {
            Some(hook) => hook.process(session, &mut diagnostics, cancel).await?,
            None => None,
        };

        sink.send_result(ServerResult::SlowUpdate { diagnostics, x })
            .await
    }
}
