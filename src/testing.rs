// SPDX-License-Identifier: MIT
//! In-process test driver.
//!
//! Drives the real dispatcher against a real session without a socket: the
//! result sink collects instead of serializing onto a connection. Used by
//! the crate's own integration tests and usable by embedders testing their
//! extensions and language backends.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cancel::CancelSignal;
use crate::config::{DaemonConfig, ServerOptions};
use crate::ipc::results::{ResultSink, ServerResult};
use crate::session::Session;
use crate::AppContext;

/// A `ResultSink` that keeps everything a command emitted.
#[derive(Default)]
pub struct CollectingSink {
    sent: Vec<ServerResult>,
}

impl CollectingSink {
    pub fn sent(&self) -> &[ServerResult] {
        &self.sent
    }
}

#[async_trait]
impl ResultSink for CollectingSink {
    async fn send_result(&mut self, result: ServerResult) -> anyhow::Result<()> {
        self.sent.push(result);
        Ok(())
    }
}

pub struct TestDriver {
    ctx: Arc<AppContext>,
    session: Session,
    sink: CollectingSink,
    cancel: CancelSignal,
}

impl TestDriver {
    /// Driver over default options: built-in `"text"` language, no hooks.
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_options(ServerOptions::default()).await
    }

    pub async fn with_options(options: ServerOptions) -> anyhow::Result<Self> {
        Self::with_config(DaemonConfig::default(), options).await
    }

    pub async fn with_config(
        config: DaemonConfig,
        options: ServerOptions,
    ) -> anyhow::Result<Self> {
        let ctx = AppContext::new(config, options)?;
        let session = ctx.create_session().await?;
        Ok(Self {
            ctx,
            session,
            sink: CollectingSink::default(),
            cancel: CancelSignal::new(),
        })
    }

    // ─── Setup ───────────────────────────────────────────────────────────────

    /// Replace the whole document.
    pub fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
        let length = self.session.text_length();
        self.session.replace_text(0, length, text, 0, "test")?;
        Ok(())
    }

    /// Replace the whole document, placing the cursor at the `|` marker:
    /// `"class C|{}"` puts the cursor between `C` and `{`.
    pub fn set_text_with_cursor(&mut self, marked: &str) -> anyhow::Result<()> {
        let marker = marked
            .char_indices()
            .find(|(_, ch)| *ch == '|')
            .map(|(byte, _)| byte)
            .ok_or_else(|| anyhow::anyhow!("marked text has no '|' cursor marker"))?;
        let text: String = marked[..marker].chars().chain(marked[marker + 1..].chars()).collect();
        let cursor = marked[..marker].chars().count();
        let length = self.session.text_length();
        self.session.replace_text(0, length, &text, cursor, "test")?;
        Ok(())
    }

    // ─── Sending ─────────────────────────────────────────────────────────────

    /// Send one raw command frame through the dispatcher.
    pub async fn send(&mut self, command: char, argument: &str) -> anyhow::Result<()> {
        let frame = format!("{command}{argument}");
        self.send_frame(&frame).await
    }

    pub async fn send_frame(&mut self, frame: &str) -> anyhow::Result<()> {
        self.ctx
            .dispatcher
            .execute(frame, &mut self.session, &mut self.sink, &self.cancel)
            .await
    }

    pub async fn send_type_chars(&mut self, chars: &str) -> anyhow::Result<()> {
        for ch in chars.chars() {
            self.send('C', &ch.to_string()).await?;
        }
        Ok(())
    }

    pub async fn send_replace_text(
        &mut self,
        start: usize,
        length: usize,
        new_cursor: usize,
        reason: &str,
        text: &str,
    ) -> anyhow::Result<()> {
        self.send('R', &format!("{start}:{length}:{new_cursor}:{reason}:{text}"))
            .await
    }

    pub async fn send_set_options(&mut self, pairs: &[(&str, &str)]) -> anyhow::Result<()> {
        let argument = pairs
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(",");
        self.send('O', &argument).await
    }

    pub async fn send_slow_update(&mut self) -> anyhow::Result<()> {
        self.send('U', "").await
    }

    pub async fn send_info_tip(&mut self, position: usize) -> anyhow::Result<()> {
        self.send('I', &position.to_string()).await
    }

    // ─── Inspection ──────────────────────────────────────────────────────────

    pub fn results(&self) -> &[ServerResult] {
        self.sink.sent()
    }

    pub fn last_result(&self) -> Option<&ServerResult> {
        self.sink.sent().last()
    }

    pub fn clear_results(&mut self) {
        self.sink.sent.clear();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }
}
