//! Session records and the effects handed back to the host.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CodeSubmission, ConversationTurn};
use crate::violations::ViolationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    NotStarted,
    InProgress,
    Ended,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::NotStarted => "not started",
            SessionStatus::InProgress => "in progress",
            SessionStatus::Ended => "ended",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub current_question_index: usize,
    pub total_questions: usize,
    /// Questions the candidate has moved past. Never exceeds `total_questions`.
    pub questions_completed: usize,
}

impl Session {
    pub fn begin(total_questions: usize, now: DateTime<Utc>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            status: SessionStatus::InProgress,
            started_at: Some(now),
            ended_at: None,
            current_question_index: 0,
            total_questions,
            questions_completed: 0,
        }
    }

    pub fn is_last_question(&self) -> bool {
        self.current_question_index + 1 >= self.total_questions
    }

    /// Milliseconds from start to `until`, clamped at zero.
    pub fn duration_ms(&self, until: DateTime<Utc>) -> i64 {
        self.started_at
            .map(|started| until.signed_duration_since(started).num_milliseconds())
            .unwrap_or(0)
            .max(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Completed,
    ViolationLimit,
    CandidateEnded,
    FullscreenDeclined,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::Completed => "completed",
            EndReason::ViolationLimit => "Proctoring violations exceeded limit",
            EndReason::CandidateEnded => "ended by candidate",
            EndReason::FullscreenDeclined => "fullscreen declined",
        }
    }
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraStatus {
    #[default]
    Unknown,
    Active,
    Inactive,
    Denied,
}

/// Terminal record of a session, persisted once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub questions_completed: usize,
    pub total_questions: usize,
    pub code_submissions: Vec<CodeSubmission>,
    pub conversation: Vec<ConversationTurn>,
    pub final_code: String,
    pub feedback: Vec<String>,
    pub violation_count: u32,
    pub termination_reason: String,
}

impl SessionSummary {
    pub fn duration_minutes(&self) -> i64 {
        (self.duration_ms + 30_000) / 60_000
    }
}

/// Work for the host to carry out after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SessionEffect {
    /// Show the "return to fullscreen?" consent prompt.
    ShowFullscreenPrompt,
    /// Call the fullscreen API (the candidate just consented).
    RequestFullscreen,
    ExitFullscreen,
    /// Keep the browser's leave-page confirmation.
    BlockUnload,
    ViolationWarning {
        kind: ViolationKind,
        count: u32,
        limit: u32,
    },
    /// Ask "Are you sure you want to end the interview?".
    ConfirmEnd { reason: EndReason },
    Alert { message: String },
    Ended { summary: SessionSummary },
}
