// SPDX-License-Identifier: MIT
//! Extension hooks — optional capabilities injected at configuration time.
//!
//! Hooks run synchronously inside the owning session's command window; an
//! absent hook is a no-op, never an error. A hook must not block on another
//! session's progress — that is a liveness bug in the deployment, not
//! something the core guards against.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::cancel::CancelSignal;
use crate::language::Diagnostic;
use crate::session::{ExtensionState, Session};

/// Claims and applies client option keys the core does not statically
/// recognize. Called once per SetOptions command with the whole unrecognized
/// batch; returns the keys it actually applied, which the dispatcher merges
/// into the options-echo result.
pub trait SetOptionsFromClient: Send + Sync {
    fn try_apply(
        &self,
        state: &mut ExtensionState,
        unrecognized: &BTreeMap<String, String>,
    ) -> Vec<String>;
}

/// Augments the slow-update pass with an extension-supplied payload.
///
/// May also rewrite the diagnostics list before it is sent.
#[async_trait]
pub trait SlowUpdateExtension: Send + Sync {
    async fn process(
        &self,
        session: &mut Session,
        diagnostics: &mut Vec<Diagnostic>,
        cancel: &CancelSignal,
    ) -> anyhow::Result<Option<Value>>;
}

/// Sees every failure the dispatcher intercepts, regardless of the
/// `include_exception_details` setting.
pub trait ExceptionLogger: Send + Sync {
    fn log_exception(&self, error: &anyhow::Error, session: &Session);
}
