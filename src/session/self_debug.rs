// SPDX-License-Identifier: MIT
//! Self-debug command log.
//!
//! When `selfDebugEnabled` is set, every processed command appends one entry
//! to a bounded per-session ring; the `Y` command dumps the ring so a client
//! can attach recent history to a bug report. Disabled sessions never
//! allocate the ring.

use std::collections::VecDeque;

use serde::Serialize;

/// Chars of buffer text captured per entry.
const EXCERPT_CHARS: usize = 100;
/// Entries retained per session.
const LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelfDebugEntry {
    /// Command id char as a one-char string.
    pub command: String,
    pub cursor: usize,
    pub text_length: usize,
    pub text_excerpt: String,
}

#[derive(Debug, Default)]
pub struct SelfDebugLog {
    entries: VecDeque<SelfDebugEntry>,
}

impl SelfDebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, command: char, cursor: usize, text_length: usize, excerpt: String) {
        if self.entries.len() == LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(SelfDebugEntry {
            command: command.to_string(),
            cursor,
            text_length,
            text_excerpt: excerpt,
        });
    }

    pub fn entries(&self) -> Vec<SelfDebugEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn excerpt_chars() -> usize {
        EXCERPT_CHARS
    }
}
