//! # interview-core
//!
//! Proctoring and session lifecycle for the mock interview app. The browser
//! shell (or any other host) feeds page events in and executes the effects
//! that come back out.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Every operation completes
//!   within one host event-loop turn.
//! - **Single owner**: The controller owns the session, the proctoring
//!   session owns the violation counter. The store is a passive snapshot.
//! - **Graceful degradation**: Persistence failures are logged and the
//!   in-memory state stays authoritative.
//! - **Effects out, events in**: Detectors never touch the platform directly.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use interview_core::{InterviewConfig, InterviewController, MemoryStore};
//!
//! let mut controller =
//!     InterviewController::new(InterviewConfig::default(), MemoryStore::new(), voice);
//! controller.hydrate()?;
//! let effects = controller.start(chrono::Utc::now())?;
//! ```

pub mod config;
pub mod error;
pub mod monitors;
pub mod proctoring;
pub mod session;
pub mod store;
pub mod types;
pub mod violations;
pub mod voice;

pub use config::*;
pub use error::{ConfigError, InterviewError, Result, SetupError, StoreError, VoiceError};
pub use monitors::{DetectorKind, MonitorSet, PageEvent, PageState, WindowGeometry};
pub use proctoring::{ProctorEffect, ProctorReport, ProctoringSession};
pub use session::{
    CameraStatus, EndReason, InterviewController, Session, SessionEffect, SessionStatus,
    SessionSummary,
};
pub use store::{FileStore, InterviewStore, MemoryStore, SessionStore, StoredInterview};
pub use types::*;
pub use violations::{Violation, ViolationKind, ViolationLog, ViolationOutcome};
pub use voice::{CallEndReason, SessionContext, VoiceClient, VoiceEvent};
