//! Script format: one JSON object per line, tagged by `op`.
//!
//! ```text
//! # comment lines and blank lines are skipped
//! {"op":"load","profile":{"fullName":"Ada"},"questions":[{"id":"q1","question":"Hi"}]}
//! {"op":"start"}
//! {"op":"event","event":{"type":"visibility_change","hidden":true}}
//! {"op":"wait","seconds":10}
//! ```

use std::path::Path;

use interview_core::{
    CallEndReason, CameraStatus, CandidateProfile, Language, PageEvent, Question, SetupError,
};
use serde::Deserialize;

use crate::error::SimError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Load {
        profile: CandidateProfile,
        questions: Vec<Question>,
        #[serde(default)]
        feedback: Vec<String>,
    },
    Hydrate,
    Start,
    Resume,
    Event {
        event: PageEvent,
    },
    Code {
        code: String,
    },
    Language {
        language: Language,
    },
    Advance,
    /// A transcript line from the voice call.
    Voice {
        text: String,
    },
    VoiceEnd {
        #[serde(default = "default_end_reason")]
        reason: CallEndReason,
    },
    VoiceError {
        message: String,
    },
    /// Toggles whether the next voice connection attempt succeeds.
    VoiceService {
        available: bool,
    },
    Cancel,
    Confirm {
        confirmed: bool,
    },
    FullscreenPrompt {
        accepted: bool,
    },
    Camera {
        status: CameraStatus,
    },
    /// A device or permission failure reported by the host during setup.
    SetupError {
        error: SetupError,
    },
    /// Advances the simulated clock and delivers a timer tick.
    Wait {
        seconds: i64,
    },
    Teardown,
}

fn default_end_reason() -> CallEndReason {
    CallEndReason::RemoteHangup
}

impl ScriptStep {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptStep::Load { .. } => "load",
            ScriptStep::Hydrate => "hydrate",
            ScriptStep::Start => "start",
            ScriptStep::Resume => "resume",
            ScriptStep::Event { .. } => "event",
            ScriptStep::Code { .. } => "code",
            ScriptStep::Language { .. } => "language",
            ScriptStep::Advance => "advance",
            ScriptStep::Voice { .. } => "voice",
            ScriptStep::VoiceEnd { .. } => "voice_end",
            ScriptStep::VoiceError { .. } => "voice_error",
            ScriptStep::VoiceService { .. } => "voice_service",
            ScriptStep::Cancel => "cancel",
            ScriptStep::Confirm { .. } => "confirm",
            ScriptStep::FullscreenPrompt { .. } => "fullscreen_prompt",
            ScriptStep::Camera { .. } => "camera",
            ScriptStep::SetupError { .. } => "setup_error",
            ScriptStep::Wait { .. } => "wait",
            ScriptStep::Teardown => "teardown",
        }
    }
}

pub fn load(path: &Path) -> Result<Vec<ScriptStep>, SimError> {
    let text = fs_err::read_to_string(path).map_err(|source| SimError::Io {
        context: format!("reading script {}", path.display()),
        source,
    })?;
    parse(&text)
}

pub fn parse(text: &str) -> Result<Vec<ScriptStep>, SimError> {
    let mut steps = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let step = serde_json::from_str(trimmed).map_err(|err| SimError::Script {
            line: index + 1,
            details: err.to_string(),
        })?;
        steps.push(step);
    }
    Ok(steps)
}
