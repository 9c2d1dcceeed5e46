//! The interview controller.
//!
//! Owns the session record, the code buffer, code submissions and the
//! transcript; owns the proctoring session, which in turn owns the violation
//! counter. Every path that stops proctoring (escalation, explicit end,
//! failed start, host teardown) goes through [`InterviewController::teardown`].
//!
//! Operations never block. Voice events queue on a channel until the host
//! calls [`InterviewController::pump_voice_events`], so a transcript line
//! and a question change in the same turn both land without loss.

use std::sync::mpsc::{self, Receiver, TryRecvError};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use super::transition::{next_status, SessionCommand};
use super::types::{
    CameraStatus, EndReason, Session, SessionEffect, SessionStatus, SessionSummary,
};
use crate::config::InterviewConfig;
use crate::error::{InterviewError, Result, SetupError, VoiceError};
use crate::monitors::PageEvent;
use crate::proctoring::{ProctorEffect, ProctoringSession};
use crate::store::{InterviewStore, SessionStore, StoredInterview};
use crate::types::{CandidateProfile, CodeSubmission, ConversationTurn, Language, Question};
use crate::voice::{SessionContext, VoiceClient, VoiceEvent};

const MISSING_INPUTS_MESSAGE: &str =
    "Please submit your resume and generate technical questions first!";
const CAMERA_REQUIRED_MESSAGE: &str = "Camera Required: this interview requires camera access. \
     Please enable your camera and refresh the page to continue.";
const CAMERA_INACTIVE_MESSAGE: &str = "Camera Inactive: the camera must remain on throughout \
     the entire interview. Please reactivate your camera to continue.";
const TERMINATED_MESSAGE: &str = "Interview terminated due to excessive proctoring violations. \
     Your session has been ended and your progress has been saved.";

pub struct InterviewController<S: SessionStore, V: VoiceClient> {
    config: InterviewConfig,
    store: InterviewStore<S>,
    voice: V,
    voice_connected: bool,
    voice_events: Option<Receiver<VoiceEvent>>,
    proctoring: ProctoringSession,
    profile: Option<CandidateProfile>,
    questions: Vec<Question>,
    feedback: Vec<String>,
    session: Session,
    code: String,
    language: Language,
    submissions: Vec<CodeSubmission>,
    conversation: Vec<ConversationTurn>,
    camera: CameraStatus,
    pending_end: Option<EndReason>,
    recoverable: Option<StoredInterview>,
    summary: Option<SessionSummary>,
}

impl<S: SessionStore, V: VoiceClient> InterviewController<S, V> {
    pub fn new(config: InterviewConfig, backend: S, voice: V) -> Self {
        let store = InterviewStore::new(backend, &config.store.key);
        let proctoring = ProctoringSession::new(&config.proctoring);
        Self {
            config,
            store,
            voice,
            voice_connected: false,
            voice_events: None,
            proctoring,
            profile: None,
            questions: Vec::new(),
            feedback: Vec::new(),
            session: Session::default(),
            code: String::new(),
            language: Language::default(),
            submissions: Vec::new(),
            conversation: Vec::new(),
            camera: CameraStatus::default(),
            pending_end: None,
            recoverable: None,
            summary: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inputs
    // ─────────────────────────────────────────────────────────────────────

    /// Reads the store once on mount.
    ///
    /// Restores the resume, questions, feedback and code buffer. A session
    /// the previous page left in progress is kept for [`Self::resume`].
    pub fn hydrate(&mut self) -> Result<()> {
        if self.session.status == SessionStatus::InProgress {
            return Err(InterviewError::InvalidTransition {
                operation: "reload stored state",
                status: self.session.status,
            });
        }

        let Some(snapshot) = self.store.load_snapshot()? else {
            debug!(key = %self.store.key(), "No stored interview snapshot");
            return Ok(());
        };

        if let Some(profile) = &snapshot.resume {
            self.profile = Some(profile.clone());
        }
        if let Some(questions) = &snapshot.technical_questions {
            self.questions = questions.clone();
        }
        if let Some(feedback) = &snapshot.feedback {
            self.feedback = feedback.clone();
        }
        if let Some(code) = &snapshot.code {
            self.code = code.clone();
        }
        if let Some(language) = snapshot.language {
            self.language = language;
        }

        let interrupted = snapshot.status == Some(SessionStatus::InProgress)
            && snapshot.is_completed != Some(true);
        if interrupted {
            info!(
                session_id = ?snapshot.session_id,
                violation_count = ?snapshot.violation_count,
                question_index = ?snapshot.current_question_index,
                "Found interrupted interview session"
            );
            self.recoverable = Some(snapshot);
        }

        Ok(())
    }

    /// Stores the resume and generated questions ahead of a session.
    pub fn load_inputs(
        &mut self,
        profile: CandidateProfile,
        questions: Vec<Question>,
        feedback: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.session.status == SessionStatus::InProgress {
            return Err(InterviewError::InvalidTransition {
                operation: "replace the interview inputs",
                status: self.session.status,
            });
        }

        self.persist(
            StoredInterview {
                resume: Some(profile.clone()),
                technical_questions: Some(questions.clone()),
                feedback: Some(feedback.clone()),
                ..Default::default()
            },
            now,
        );
        info!(
            candidate = %profile.full_name,
            question_count = questions.len(),
            "Interview inputs loaded"
        );
        self.profile = Some(profile);
        self.questions = questions;
        self.feedback = feedback;
        Ok(())
    }

    pub fn set_code(&mut self, code: &str, now: DateTime<Utc>) {
        self.code = code.to_string();
        self.persist(
            StoredInterview {
                code: Some(self.code.clone()),
                ..Default::default()
            },
            now,
        );
    }

    pub fn select_language(&mut self, language: Language, now: DateTime<Utc>) {
        self.language = language;
        debug!(language = language.display_name(), "Editor language selected");
        self.persist(
            StoredInterview {
                language: Some(language),
                ..Default::default()
            },
            now,
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Starts a new session: the voice call first, then proctoring.
    ///
    /// Missing inputs or a failed voice connection leave everything as it
    /// was, including the violation count and the stored summary of a
    /// previous session.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<Vec<SessionEffect>> {
        self.check(SessionCommand::Start)?;
        let profile = self.require_inputs()?;

        let context =
            SessionContext::build(&profile, &self.questions, &self.code, &self.config.voice);
        if let Err(err) = self.connect_voice(&context) {
            error!(error = %err, "Failed to start voice interview");
            return Err(err.into());
        }
        let report = self.proctoring.activate(&mut self.store, now);

        self.session = Session::begin(self.questions.len(), now);
        self.submissions.clear();
        self.conversation.clear();
        self.pending_end = None;
        self.summary = None;
        self.recoverable = None;

        if let Err(err) = self.store.clear_session_fields(now) {
            warn!(error = %err, "Failed to clear previous session from store");
        }
        self.persist(self.session_patch(), now);
        info!(
            session_id = %self.session.id,
            candidate = %profile.full_name,
            total_questions = self.session.total_questions,
            "Interview started"
        );

        let mut effects = proctor_effects(&report.effects);
        if report.limit_exceeded {
            effects.extend(self.end(EndReason::ViolationLimit, now));
        }
        Ok(effects)
    }

    /// Continues the session found by [`Self::hydrate`] after a reload.
    ///
    /// The question index, submissions, transcript and violation count all
    /// carry over.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<Vec<SessionEffect>> {
        self.check(SessionCommand::Resume)?;
        let Some(snapshot) = self.recoverable.take() else {
            return Err(InterviewError::NoRecoverableSession);
        };
        let profile = match self.require_inputs() {
            Ok(profile) => profile,
            Err(err) => {
                self.recoverable = Some(snapshot);
                return Err(err);
            }
        };

        let context =
            SessionContext::build(&profile, &self.questions, &self.code, &self.config.voice);
        if let Err(err) = self.connect_voice(&context) {
            error!(error = %err, "Failed to reconnect voice interview");
            self.recoverable = Some(snapshot);
            return Err(err.into());
        }
        let violation_count = snapshot.violation_count.unwrap_or(0);
        let report = self
            .proctoring
            .resume(violation_count, &mut self.store, now);

        let total_questions = self.questions.len();
        let index = snapshot
            .current_question_index
            .unwrap_or(0)
            .min(total_questions.saturating_sub(1));
        self.session = Session {
            id: snapshot
                .session_id
                .unwrap_or_else(|| ulid::Ulid::new().to_string()),
            status: SessionStatus::InProgress,
            started_at: snapshot.started_at.or(Some(now)),
            ended_at: None,
            current_question_index: index,
            total_questions,
            questions_completed: index,
        };
        self.submissions = snapshot.code_submissions.unwrap_or_default();
        self.conversation = snapshot.conversation.unwrap_or_default();
        self.pending_end = None;
        self.summary = None;

        self.persist(self.session_patch(), now);
        info!(
            session_id = %self.session.id,
            question_index = index,
            violation_count,
            "Interview resumed"
        );

        let mut effects = proctor_effects(&report.effects);
        if report.limit_exceeded || self.proctoring.violation_log().is_escalated() {
            effects.extend(self.end(EndReason::ViolationLimit, now));
        }
        Ok(effects)
    }

    /// Moves past the current question, capturing code for coding questions.
    /// On the last question this ends the session as completed.
    pub fn advance_question(&mut self, now: DateTime<Utc>) -> Result<Vec<SessionEffect>> {
        let last = self.session.is_last_question();
        self.check(SessionCommand::Advance { last })?;
        if self.config.proctoring.require_camera && self.camera != CameraStatus::Active {
            return Err(InterviewError::CameraRequired);
        }

        let index = self.session.current_question_index;
        if let Some(question) = self.questions.get(index) {
            if question.is_coding() {
                self.submissions.push(CodeSubmission {
                    question_id: question.id.clone(),
                    code: self.code.clone(),
                    language: self.language,
                    submitted_at: now,
                });
                debug!(question_id = %question.id, language = %self.language, "Code submitted");
            }
        }
        self.session.questions_completed = (index + 1).min(self.session.total_questions);

        if last {
            return Ok(self.end(EndReason::Completed, now));
        }

        self.session.current_question_index += 1;
        self.code.clear();
        self.persist(
            StoredInterview {
                current_question_index: Some(self.session.current_question_index),
                code_submissions: Some(self.submissions.clone()),
                code: Some(String::new()),
                ..Default::default()
            },
            now,
        );
        info!(
            question_index = self.session.current_question_index,
            total_questions = self.session.total_questions,
            "Advanced to next question"
        );
        Ok(Vec::new())
    }

    /// First half of a candidate-initiated end: ask for confirmation.
    pub fn request_cancel(&mut self) -> Result<Vec<SessionEffect>> {
        self.check(SessionCommand::End)?;
        self.pending_end = Some(EndReason::CandidateEnded);
        Ok(vec![SessionEffect::ConfirmEnd {
            reason: EndReason::CandidateEnded,
        }])
    }

    /// Second half: the candidate answered the confirmation.
    pub fn resolve_cancel(&mut self, confirmed: bool, now: DateTime<Utc>) -> Vec<SessionEffect> {
        let Some(reason) = self.pending_end.take() else {
            return Vec::new();
        };
        if self.session.status != SessionStatus::InProgress {
            return Vec::new();
        }
        if confirmed {
            return self.end(reason, now);
        }

        info!(reason = %reason, "Candidate kept the interview going");
        if reason == EndReason::FullscreenDeclined
            && self.proctoring.is_active()
            && !self.proctoring.page().fullscreen
        {
            vec![SessionEffect::ShowFullscreenPrompt]
        } else {
            Vec::new()
        }
    }

    /// Answer to the fullscreen consent prompt. Declining means the
    /// candidate wants to stop; it never counts as a violation.
    pub fn resolve_fullscreen_prompt(&mut self, accepted: bool) -> Vec<SessionEffect> {
        if self.session.status != SessionStatus::InProgress {
            return Vec::new();
        }
        if accepted {
            return vec![SessionEffect::RequestFullscreen];
        }

        self.pending_end = Some(EndReason::FullscreenDeclined);
        vec![SessionEffect::ConfirmEnd {
            reason: EndReason::FullscreenDeclined,
        }]
    }

    /// Ends the session and persists its summary.
    ///
    /// Persistence is best effort: the in-memory transition to `Ended`
    /// happens even if the write fails. Calling this outside `InProgress`
    /// does nothing.
    pub fn end(&mut self, reason: EndReason, now: DateTime<Utc>) -> Vec<SessionEffect> {
        if next_status(self.session.status, SessionCommand::End).is_none() {
            debug!(reason = %reason, status = %self.session.status, "End ignored");
            return Vec::new();
        }

        let mut effects = self.teardown(now);
        self.pending_end = None;

        let summary = SessionSummary {
            session_id: self.session.id.clone(),
            started_at: self.session.started_at,
            ended_at: now,
            duration_ms: self.session.duration_ms(now),
            questions_completed: self
                .session
                .questions_completed
                .min(self.session.total_questions),
            total_questions: self.session.total_questions,
            code_submissions: self.submissions.clone(),
            conversation: self.conversation.clone(),
            final_code: self.code.clone(),
            feedback: self.feedback.clone(),
            violation_count: self.proctoring.violation_count(),
            termination_reason: reason.as_str().to_string(),
        };
        self.session.status = SessionStatus::Ended;
        self.session.ended_at = Some(now);

        let patch = StoredInterview {
            status: Some(SessionStatus::Ended),
            ended_at: Some(now),
            is_completed: Some(true),
            is_proctoring_active: Some(false),
            violation_count: Some(summary.violation_count),
            termination_reason: Some(summary.termination_reason.clone()),
            duration: Some(summary.duration_ms),
            questions_completed: Some(summary.questions_completed),
            total_questions: Some(summary.total_questions),
            current_question_index: Some(self.session.current_question_index),
            code: Some(summary.final_code.clone()),
            code_submissions: Some(summary.code_submissions.clone()),
            conversation: Some(summary.conversation.clone()),
            ..Default::default()
        };
        if let Err(err) = self.store.merge(&patch, now) {
            warn!(
                error = %err,
                session_id = %summary.session_id,
                "Failed to persist session summary; keeping in-memory result"
            );
        }

        info!(
            session_id = %summary.session_id,
            reason = %reason,
            duration_ms = summary.duration_ms,
            questions_completed = summary.questions_completed,
            total_questions = summary.total_questions,
            violation_count = summary.violation_count,
            "Interview ended"
        );

        effects.push(SessionEffect::Alert {
            message: end_message(&summary, reason),
        });
        effects.push(SessionEffect::Ended {
            summary: summary.clone(),
        });
        self.summary = Some(summary);
        effects
    }

    /// Stops the voice call and every detector. Idempotent; safe from any state.
    ///
    /// Hosts call this on unmount. A session torn down while in progress stays
    /// in progress in the store and can be resumed after a reload.
    pub fn teardown(&mut self, now: DateTime<Utc>) -> Vec<SessionEffect> {
        if self.voice_connected {
            self.voice.stop();
            self.voice_connected = false;
            debug!("Voice client stopped");
        }
        self.voice_events = None;
        proctor_effects(&self.proctoring.deactivate(&mut self.store, now))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inbound events
    // ─────────────────────────────────────────────────────────────────────

    /// Routes a browser event through proctoring; force-ends on escalation.
    pub fn handle_page_event(
        &mut self,
        event: &PageEvent,
        now: DateTime<Utc>,
    ) -> Vec<SessionEffect> {
        let report = self.proctoring.handle_event(event, &mut self.store, now);
        let mut effects = proctor_effects(&report.effects);
        if report.limit_exceeded && self.session.status == SessionStatus::InProgress {
            effects.extend(self.end(EndReason::ViolationLimit, now));
        }
        effects
    }

    /// Drains queued voice events in arrival order.
    pub fn pump_voice_events(&mut self, now: DateTime<Utc>) -> Vec<SessionEffect> {
        let mut received = Vec::new();
        let mut disconnected = false;
        if let Some(events) = &self.voice_events {
            loop {
                match events.try_recv() {
                    Ok(event) => received.push(event),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
        }
        if disconnected {
            debug!("Voice event channel closed");
            self.voice_events = None;
        }

        let mut effects = Vec::new();
        let mut transcript_changed = false;
        for event in received {
            if self.session.status != SessionStatus::InProgress {
                debug!(event = ?event, "Voice event after session end dropped");
                continue;
            }
            match event {
                VoiceEvent::Message { text } => {
                    let turn = ConversationTurn::new(text);
                    debug!(
                        speaker = ?turn.speaker(),
                        chars = turn.text().len(),
                        "Transcript line received"
                    );
                    self.conversation.push(turn);
                    transcript_changed = true;
                }
                VoiceEvent::CallEnded { reason } => {
                    info!(reason = ?reason, "Voice client ended the call");
                    effects.extend(self.end(EndReason::Completed, now));
                }
                VoiceEvent::Error { message } => {
                    warn!(message = %message, "Voice client error");
                    effects.push(SessionEffect::Alert {
                        message: format!("Voice interviewer error: {}", message),
                    });
                }
            }
        }

        if transcript_changed && self.session.status == SessionStatus::InProgress {
            self.persist(
                StoredInterview {
                    conversation: Some(self.conversation.clone()),
                    ..Default::default()
                },
                now,
            );
        }
        effects
    }

    // ─────────────────────────────────────────────────────────────────────
    // Degraded setup
    // ─────────────────────────────────────────────────────────────────────

    pub fn set_camera_status(&mut self, status: CameraStatus) -> Vec<SessionEffect> {
        let previous = std::mem::replace(&mut self.camera, status);
        if previous == status || !self.config.proctoring.require_camera {
            return Vec::new();
        }

        match status {
            CameraStatus::Denied => {
                warn!("Camera access denied");
                vec![SessionEffect::Alert {
                    message: CAMERA_REQUIRED_MESSAGE.to_string(),
                }]
            }
            CameraStatus::Inactive => vec![SessionEffect::Alert {
                message: CAMERA_INACTIVE_MESSAGE.to_string(),
            }],
            CameraStatus::Active | CameraStatus::Unknown => Vec::new(),
        }
    }

    /// A permission the detectors rely on was refused. Camera problems block
    /// progress until resolved; fullscreen problems re-prompt.
    pub fn report_setup_error(&mut self, err: SetupError) -> Vec<SessionEffect> {
        warn!(error = %err, "Proctoring setup degraded");
        match err {
            SetupError::CameraDenied(_) => self.set_camera_status(CameraStatus::Denied),
            SetupError::FullscreenRejected(_) => {
                let in_session = self.session.status == SessionStatus::InProgress;
                if in_session && self.proctoring.is_active() {
                    vec![SessionEffect::ShowFullscreenPrompt]
                } else {
                    Vec::new()
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn profile(&self) -> Option<&CandidateProfile> {
        self.profile.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.session.status != SessionStatus::InProgress {
            return None;
        }
        self.questions.get(self.session.current_question_index)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn submissions(&self) -> &[CodeSubmission] {
        &self.submissions
    }

    pub fn conversation(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    pub fn camera_status(&self) -> CameraStatus {
        self.camera
    }

    pub fn pending_end(&self) -> Option<EndReason> {
        self.pending_end
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn violation_count(&self) -> u32 {
        self.proctoring.violation_count()
    }

    /// "Violations: n/limit".
    pub fn violation_status_line(&self) -> String {
        self.proctoring.violation_log().status_line()
    }

    pub fn proctoring(&self) -> &ProctoringSession {
        &self.proctoring
    }

    pub fn is_proctoring_active(&self) -> bool {
        self.proctoring.is_active()
    }

    pub fn has_recoverable_session(&self) -> bool {
        self.recoverable.is_some()
    }

    pub fn is_voice_connected(&self) -> bool {
        self.voice_connected
    }

    pub fn store(&self) -> &InterviewStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut InterviewStore<S> {
        &mut self.store
    }

    pub fn voice(&self) -> &V {
        &self.voice
    }

    pub fn voice_mut(&mut self) -> &mut V {
        &mut self.voice
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn check(&self, command: SessionCommand) -> Result<SessionStatus> {
        match next_status(self.session.status, command) {
            Some(next) => Ok(next),
            None => Err(InterviewError::InvalidTransition {
                operation: command.name(),
                status: self.session.status,
            }),
        }
    }

    fn require_inputs(&self) -> Result<CandidateProfile> {
        match &self.profile {
            Some(profile) if !self.questions.is_empty() => Ok(profile.clone()),
            _ => {
                warn!(
                    has_profile = self.profile.is_some(),
                    question_count = self.questions.len(),
                    "Interview inputs missing"
                );
                Err(InterviewError::Precondition {
                    message: MISSING_INPUTS_MESSAGE.to_string(),
                })
            }
        }
    }

    fn connect_voice(&mut self, context: &SessionContext) -> std::result::Result<(), VoiceError> {
        let (sender, receiver) = mpsc::channel();
        self.voice.start(context, sender)?;
        self.voice_connected = true;
        self.voice_events = Some(receiver);
        Ok(())
    }

    fn session_patch(&self) -> StoredInterview {
        StoredInterview {
            session_id: Some(self.session.id.clone()),
            status: Some(self.session.status),
            started_at: self.session.started_at,
            current_question_index: Some(self.session.current_question_index),
            total_questions: Some(self.session.total_questions),
            code_submissions: Some(self.submissions.clone()),
            conversation: Some(self.conversation.clone()),
            code: Some(self.code.clone()),
            language: Some(self.language),
            violation_count: Some(self.proctoring.violation_count()),
            is_proctoring_active: Some(self.proctoring.is_active()),
            is_completed: Some(false),
            ..Default::default()
        }
    }

    fn persist(&mut self, patch: StoredInterview, now: DateTime<Utc>) {
        if let Err(err) = self.store.merge(&patch, now) {
            warn!(error = %err, "Failed to persist interview snapshot");
        }
    }
}

fn proctor_effects(effects: &[ProctorEffect]) -> Vec<SessionEffect> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            ProctorEffect::ShowFullscreenPrompt => Some(SessionEffect::ShowFullscreenPrompt),
            ProctorEffect::ExitFullscreen => Some(SessionEffect::ExitFullscreen),
            ProctorEffect::BlockUnload => Some(SessionEffect::BlockUnload),
            ProctorEffect::ViolationWarning { kind, count, limit } => {
                Some(SessionEffect::ViolationWarning {
                    kind: *kind,
                    count: *count,
                    limit: *limit,
                })
            }
            // The controller follows up with an Ended effect.
            ProctorEffect::LimitExceeded { .. } => None,
        })
        .collect()
}

fn end_message(summary: &SessionSummary, reason: EndReason) -> String {
    let headline = match reason {
        EndReason::ViolationLimit => return TERMINATED_MESSAGE.to_string(),
        EndReason::Completed => "Interview completed successfully!",
        EndReason::CandidateEnded | EndReason::FullscreenDeclined => "Interview ended.",
    };
    format!(
        "{} Duration: {} minutes. Questions completed: {}/{}. Your responses have been saved.",
        headline,
        summary.duration_minutes(),
        summary.questions_completed,
        summary.total_questions
    )
}
