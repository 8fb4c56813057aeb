//! Timestamped log of notable session events shown in the console's activity
//! pane: connection changes, submissions, verification failures and status
//! lines from the companion.

use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// Maximum number of entries kept in memory.
pub const MAX_ACTIVITY_ENTRIES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub at: DateTime<Local>,
    pub kind: ActivityKind,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ActivityKind, message: impl Into<String>) {
        if self.entries.len() == MAX_ACTIVITY_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(ActivityEntry {
            at: Local::now(),
            kind,
            message: message.into(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ActivityKind::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(ActivityKind::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ActivityKind::Error, message);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ActivityEntry> {
        self.entries.back()
    }

    /// Newest entries first.
    pub fn recent(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter().rev()
    }
}
