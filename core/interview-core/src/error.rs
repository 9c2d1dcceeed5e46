//! Error types for interview-core operations.
//!
//! None of these are fatal to the host. Persistence errors in particular are
//! usually logged and swallowed by the controller.

use std::path::PathBuf;

use crate::session::SessionStatus;

// ═══════════════════════════════════════════════════════════════════════════════
// Persistence
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store writes are disabled for key {key}")]
    WriteRejected { key: String },
}

// ═══════════════════════════════════════════════════════════════════════════════
// Collaborators
// ═══════════════════════════════════════════════════════════════════════════════

/// Failures reported by the external voice-interview client.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("Voice client failed to connect: {0}")]
    Connect(String),
}

/// A detector could not be set up because the platform refused a permission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SetupError {
    #[error("Camera access denied or not available: {0}")]
    CameraDenied(String),

    #[error("Fullscreen request rejected: {0}")]
    FullscreenRejected(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration file malformed: {path}: {details}")]
    Malformed { path: PathBuf, details: String },

    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors surfaced by [`crate::InterviewController`] operations.
///
/// Each variant leaves the controller in the state it was in before the call.
#[derive(Debug, thiserror::Error)]
pub enum InterviewError {
    #[error("{message}")]
    Precondition { message: String },

    #[error("Cannot {operation} while the session is {status}")]
    InvalidTransition {
        operation: &'static str,
        status: SessionStatus,
    },

    #[error("Camera must be active to proceed. Please enable your camera.")]
    CameraRequired,

    #[error("No interrupted session to resume")]
    NoRecoverableSession,

    #[error("Failed to start interview: {0}")]
    VoiceClient(#[from] VoiceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience type alias for Results using InterviewError.
pub type Result<T> = std::result::Result<T, InterviewError>;

impl From<InterviewError> for String {
    fn from(err: InterviewError) -> String {
        err.to_string()
    }
}
