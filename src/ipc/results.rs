// SPDX-License-Identifier: MIT
//! Outbound result protocol.
//!
//! Every result is one tagged JSON object in one WebSocket text frame.
//! Handlers emit through the `ResultSink` abstraction and never touch the
//! socket; emitting nothing at all is valid and distinct from an `error`
//! result.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::language::{CompletionItem, Diagnostic, Span};
use crate::session::self_debug::SelfDebugEntry;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerResult {
    /// Completion candidates after TypeChar, best first.
    Completions { completions: Vec<CompletionItem> },
    /// Exactly the option pairs that were applied — never the full request.
    OptionsEcho { options: BTreeMap<String, String> },
    /// Full diagnostics pass, optionally augmented by the slow-update hook.
    SlowUpdate {
        diagnostics: Vec<Diagnostic>,
        #[serde(skip_serializing_if = "Option::is_none")]
        x: Option<Value>,
    },
    InfoTip { text: String, span: Span },
    SelfDebug { log: Vec<SelfDebugEntry> },
    Error { message: String },
}

/// Where handlers and the dispatcher emit results. Decoupled from the
/// transport: the server hands each session worker a channel-backed sink,
/// tests hand in a collecting one.
#[async_trait]
pub trait ResultSink: Send {
    async fn send_result(&mut self, result: ServerResult) -> anyhow::Result<()>;
}

/// Serializes results and queues them for the connection's write half.
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ResultSink for ChannelSink {
    async fn send_result(&mut self, result: ServerResult) -> anyhow::Result<()> {
        let json = serde_json::to_string(&result)?;
        self.tx
            .send(json)
            .await
            .map_err(|_| anyhow::anyhow!("connection closed, result dropped"))
    }
}
