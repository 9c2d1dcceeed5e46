//! Shared fixtures for controller integration tests.

#![allow(dead_code)]

use std::sync::mpsc::Sender;

use chrono::{DateTime, Duration, TimeZone, Utc};
use interview_core::{
    CameraStatus, CandidateProfile, InterviewConfig, InterviewController, MemoryStore, PageEvent,
    Question, SessionContext, VoiceClient, VoiceError, VoiceEvent, WindowGeometry,
};

/// Voice client double that records calls and lets tests emit events.
#[derive(Default)]
pub struct FakeVoice {
    pub sender: Option<Sender<VoiceEvent>>,
    pub fail_start: bool,
    pub starts: usize,
    pub stops: usize,
    pub last_context: Option<SessionContext>,
}

impl FakeVoice {
    pub fn emit(&self, event: VoiceEvent) {
        if let Some(sender) = &self.sender {
            sender.send(event).unwrap();
        }
    }
}

impl VoiceClient for FakeVoice {
    fn start(
        &mut self,
        context: &SessionContext,
        events: Sender<VoiceEvent>,
    ) -> Result<(), VoiceError> {
        if self.fail_start {
            return Err(VoiceError::Connect("network unreachable".to_string()));
        }
        self.starts += 1;
        self.sender = Some(events);
        self.last_context = Some(context.clone());
        Ok(())
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.sender = None;
    }
}

pub type Controller = InterviewController<MemoryStore, FakeVoice>;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

pub fn at(seconds: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(seconds)
}

pub fn profile() -> CandidateProfile {
    CandidateProfile {
        full_name: "Grace Hopper".to_string(),
        email: "grace@example.com".to_string(),
        experience: "10 years compilers".to_string(),
        education: "PhD Mathematics".to_string(),
        skills: vec!["COBOL".to_string(), "Rust".to_string()],
    }
}

pub fn questions() -> Vec<Question> {
    vec![
        Question::verbal("q1", "Walk me through a project you are proud of."),
        Question::coding("q2", "Reverse a linked list."),
        Question::verbal("q3", "How do you handle disagreements?"),
    ]
}

/// The three standard questions plus a closing coding exercise.
pub fn four_questions() -> Vec<Question> {
    let mut all = questions();
    all.push(Question::coding("q4", "Implement an LRU cache."));
    all
}

/// Controller with inputs loaded, a maximized fullscreen window, and an active camera.
pub fn ready_controller() -> Controller {
    ready_controller_with(InterviewController::new(
        InterviewConfig::default(),
        MemoryStore::new(),
        FakeVoice::default(),
    ))
}

pub fn ready_controller_with(controller: Controller) -> Controller {
    ready_controller_with_questions(controller, questions())
}

pub fn ready_controller_with_questions(
    mut controller: Controller,
    questions: Vec<Question>,
) -> Controller {
    let feedback = vec!["Strong systems background".to_string()];
    controller
        .load_inputs(profile(), questions, feedback, t0())
        .unwrap();
    enter_fullscreen(&mut controller, t0());
    controller.set_camera_status(CameraStatus::Active);
    controller
}

pub fn enter_fullscreen(controller: &mut Controller, now: DateTime<Utc>) {
    controller.handle_page_event(
        &PageEvent::Resize {
            geometry: WindowGeometry::maximized(1920, 1080),
        },
        now,
    );
    controller.handle_page_event(&PageEvent::FullscreenChange { fullscreen: true }, now);
}
