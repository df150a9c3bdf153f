// SPDX-License-Identifier: MIT
//! Cooperative cancellation for in-flight commands.
//!
//! One `CancelSignal` is shared between a connection's read loop and its
//! session worker. The read loop trips it when the socket closes or errors
//! mid-command; long-running handler work (language analysis) polls it and
//! bails out instead of completing unnecessary work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag, cheap to clone and poll.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the signal. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Early-out helper for handler loops: `signal.bail_if_cancelled()?`.
    pub fn bail_if_cancelled(&self) -> anyhow::Result<()> {
        if self.is_cancelled() {
            anyhow::bail!("command cancelled");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_clear_and_trips_once() {
        let signal = CancelSignal::new();
        assert!(!signal.is_cancelled());
        signal.cancel();
        assert!(signal.is_cancelled());
        signal.cancel();
        assert!(signal.is_cancelled());
    }

    #[test]
    fn clones_share_the_flag() {
        let signal = CancelSignal::new();
        let seen_by_worker = signal.clone();
        signal.cancel();
        assert!(seen_by_worker.is_cancelled());
        assert!(seen_by_worker.bail_if_cancelled().is_err());
    }
}
