//! Interview session lifecycle.
//!
//! ```text
//! NotStarted ──start/resume──▶ InProgress ──end──▶ Ended
//!     ▲                                              │
//!     └──────────────(new session via start)─────────┘
//! ```
//!
//! - [`transition`]: which commands are legal in which state
//! - [`types`]: session record, end reasons, summary, host effects
//! - [`controller`]: [`InterviewController`], the owner of all of the above

mod controller;
pub mod transition;
mod types;

pub use controller::InterviewController;
pub use types::{CameraStatus, EndReason, Session, SessionEffect, SessionStatus, SessionSummary};
