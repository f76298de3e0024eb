//! Activity log shown to the user next to the buffer.
//!
//! Bounded ring of entries; the oldest are dropped once capacity is hit.

use serde::Serialize;
use std::collections::VecDeque;

/// What produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A natural-language instruction sent to the assistant
    Instruction,
    /// A command line that was executed
    Command,
    /// Commands received from the assistant
    AssistReply,
    /// The assistant request failed
    AssistError,
}

/// One line in the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub kind: EntryKind,
    pub success: bool,
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = if self.success { "✓" } else { "✗" };
        write!(f, "{mark} {}", self.message)
    }
}

/// Bounded, ordered activity log.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
        }
    }

    /// Appends an entry, evicting the oldest one when full.
    pub fn push(&mut self, kind: EntryKind, success: bool, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            kind,
            success,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(500)
    }
}
