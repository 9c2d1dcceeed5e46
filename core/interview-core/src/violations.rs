//! Violation counting and the escalation threshold.
//!
//! The count is the only value consulted for escalation. It is held in one
//! owned field and never re-read from the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_VIOLATION_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    FullscreenExit,
    TabSwitch,
    WindowResize,
    ClipboardCopy,
    ClipboardPaste,
    MultiMonitor,
    SuspiciousScreenConfig,
}

impl ViolationKind {
    pub fn label(&self) -> &'static str {
        match self {
            ViolationKind::FullscreenExit => "Exited full screen mode",
            ViolationKind::TabSwitch => "Tab switching detected",
            ViolationKind::WindowResize => "Window minimizing detected",
            ViolationKind::ClipboardCopy => "Copy action detected",
            ViolationKind::ClipboardPaste => "Paste action detected",
            ViolationKind::MultiMonitor => "Multiple monitors detected",
            ViolationKind::SuspiciousScreenConfig => "Suspicious screen configuration detected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub kind: ViolationKind,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationOutcome {
    /// Counted, still within the limit.
    Warning { count: u32, limit: u32 },
    /// Counted, and this violation pushed the count past the limit.
    LimitExceeded { count: u32 },
    /// Not counted: the log already escalated.
    Ignored,
}

/// Append-only violation record for one session.
#[derive(Debug, Clone)]
pub struct ViolationLog {
    limit: u32,
    count: u32,
    entries: Vec<Violation>,
    escalated: bool,
}

impl ViolationLog {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            count: 0,
            entries: Vec::new(),
            escalated: false,
        }
    }

    /// Starts a new session's count.
    pub fn reset(&mut self) {
        self.count = 0;
        self.entries.clear();
        self.escalated = false;
    }

    /// Continues a session whose count was persisted before a reload.
    ///
    /// Individual entries from before the reload are not recoverable; only
    /// the count carries over.
    pub fn restore(&mut self, count: u32) {
        self.count = count;
        self.entries.clear();
        self.escalated = count > self.limit;
    }

    pub fn record(&mut self, kind: ViolationKind, at: DateTime<Utc>) -> ViolationOutcome {
        if self.escalated {
            return ViolationOutcome::Ignored;
        }

        self.count += 1;
        self.entries.push(Violation {
            kind,
            occurred_at: at,
        });

        if self.count > self.limit {
            self.escalated = true;
            ViolationOutcome::LimitExceeded { count: self.count }
        } else {
            ViolationOutcome::Warning {
                count: self.count,
                limit: self.limit,
            }
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }

    pub fn is_escalated(&self) -> bool {
        self.escalated
    }

    pub fn entries(&self) -> &[Violation] {
        &self.entries
    }

    /// The counter shown next to the webcam, e.g. "Violations: 2/3".
    pub fn status_line(&self) -> String {
        format!("Violations: {}/{}", self.count, self.limit)
    }
}
