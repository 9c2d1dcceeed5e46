//! Replays a parsed script against a controller and prints effects.

use std::io::Write;

use chrono::{DateTime, Duration, Utc};
use interview_core::{
    InterviewConfig, InterviewController, InterviewError, PageEvent, SessionEffect, SessionStore,
    VoiceEvent,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::SimError;
use crate::script::ScriptStep;
use crate::voice::ScriptedVoiceClient;

pub struct Runner<S: SessionStore, W: Write> {
    controller: InterviewController<S, ScriptedVoiceClient>,
    clock: DateTime<Utc>,
    out: W,
}

impl<S: SessionStore, W: Write> Runner<S, W> {
    pub fn new(config: InterviewConfig, backend: S, start: DateTime<Utc>, out: W) -> Self {
        Self {
            controller: InterviewController::new(config, backend, ScriptedVoiceClient::new()),
            clock: start,
            out,
        }
    }

    pub fn controller(&self) -> &InterviewController<S, ScriptedVoiceClient> {
        &self.controller
    }

    /// Runs every step, then tears the controller down and prints a final
    /// status line. Rejected operations are reported and the script continues.
    pub fn run(&mut self, steps: &[ScriptStep]) -> Result<(), SimError> {
        for (index, step) in steps.iter().enumerate() {
            debug!(step = index + 1, op = step.name(), "Applying script step");
            match self.apply(step) {
                Ok(effects) => {
                    for effect in &effects {
                        self.write_effect(effect)?;
                    }
                }
                Err(err) => {
                    warn!(step = index + 1, op = step.name(), error = %err, "Operation rejected");
                    self.write_line(&json!({
                        "step": index + 1,
                        "op": step.name(),
                        "error": err.to_string(),
                    }))?;
                }
            }
        }

        let effects = self.controller.teardown(self.clock);
        for effect in &effects {
            self.write_effect(effect)?;
        }
        self.write_line(&json!({
            "status": self.controller.status().as_str(),
            "violations": self.controller.violation_status_line(),
            "questionIndex": self.controller.session().current_question_index,
        }))
    }

    fn apply(&mut self, step: &ScriptStep) -> Result<Vec<SessionEffect>, InterviewError> {
        let now = self.clock;
        let effects = match step {
            ScriptStep::Load {
                profile,
                questions,
                feedback,
            } => {
                let controller = &mut self.controller;
                controller.load_inputs(profile.clone(), questions.clone(), feedback.clone(), now)?;
                Vec::new()
            }
            ScriptStep::Hydrate => {
                self.controller.hydrate()?;
                Vec::new()
            }
            ScriptStep::Start => {
                let effects = self.controller.start(now)?;
                if let Some(context) = self.controller.voice().context() {
                    debug!(first_message = %context.first_message, "Voice session context sent");
                }
                effects
            }
            ScriptStep::Resume => self.controller.resume(now)?,
            ScriptStep::Event { event } => self.controller.handle_page_event(event, now),
            ScriptStep::Code { code } => {
                self.controller.set_code(code, now);
                Vec::new()
            }
            ScriptStep::Language { language } => {
                self.controller.select_language(*language, now);
                Vec::new()
            }
            ScriptStep::Advance => self.controller.advance_question(now)?,
            ScriptStep::Voice { text } => self.voice(VoiceEvent::Message { text: text.clone() }),
            ScriptStep::VoiceEnd { reason } => {
                self.voice(VoiceEvent::CallEnded { reason: *reason })
            }
            ScriptStep::VoiceError { message } => {
                let message = message.clone();
                self.voice(VoiceEvent::Error { message })
            }
            ScriptStep::VoiceService { available } => {
                self.controller.voice_mut().set_fail_start(!available);
                Vec::new()
            }
            ScriptStep::Cancel => self.controller.request_cancel()?,
            ScriptStep::Confirm { confirmed } => self.controller.resolve_cancel(*confirmed, now),
            ScriptStep::FullscreenPrompt { accepted } => {
                self.controller.resolve_fullscreen_prompt(*accepted)
            }
            ScriptStep::Camera { status } => self.controller.set_camera_status(*status),
            ScriptStep::SetupError { error } => self.controller.report_setup_error(error.clone()),
            ScriptStep::Wait { seconds } => {
                self.clock += Duration::seconds(*seconds);
                let tick = self.clock;
                let mut effects = self.controller.handle_page_event(&PageEvent::Tick, tick);
                effects.extend(self.controller.pump_voice_events(tick));
                effects
            }
            ScriptStep::Teardown => self.controller.teardown(now),
        };
        Ok(effects)
    }

    fn voice(&mut self, event: VoiceEvent) -> Vec<SessionEffect> {
        self.controller.voice().emit(event);
        self.controller.pump_voice_events(self.clock)
    }

    fn write_effect(&mut self, effect: &SessionEffect) -> Result<(), SimError> {
        let value = serde_json::to_value(effect).map_err(|source| SimError::Encode {
            context: "encoding effect".to_string(),
            source,
        })?;
        self.write_line(&value)
    }

    fn write_line(&mut self, value: &serde_json::Value) -> Result<(), SimError> {
        writeln!(self.out, "{}", value).map_err(|source| SimError::Io {
            context: "writing output".to_string(),
            source,
        })
    }
}
