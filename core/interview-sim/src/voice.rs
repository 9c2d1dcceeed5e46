//! Voice client that plays back transcript lines from the script.

use std::sync::mpsc::Sender;

use interview_core::{SessionContext, VoiceClient, VoiceError, VoiceEvent};
use tracing::debug;

#[derive(Debug, Default)]
pub struct ScriptedVoiceClient {
    sender: Option<Sender<VoiceEvent>>,
    context: Option<SessionContext>,
    fail_start: bool,
}

impl ScriptedVoiceClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `start` fail, as an unreachable voice service would.
    pub fn set_fail_start(&mut self, fail: bool) {
        self.fail_start = fail;
    }

    pub fn context(&self) -> Option<&SessionContext> {
        self.context.as_ref()
    }

    /// Queues an event for the controller. Returns false when no call is up.
    pub fn emit(&self, event: VoiceEvent) -> bool {
        match &self.sender {
            Some(sender) => sender.send(event).is_ok(),
            None => {
                debug!(event = ?event, "Voice event dropped, no active call");
                false
            }
        }
    }
}

impl VoiceClient for ScriptedVoiceClient {
    fn start(
        &mut self,
        context: &SessionContext,
        events: Sender<VoiceEvent>,
    ) -> Result<(), VoiceError> {
        if self.fail_start {
            return Err(VoiceError::Connect(
                "scripted voice service unavailable".to_string(),
            ));
        }
        debug!(candidate = %context.candidate_name, "Scripted voice call started");
        self.context = Some(context.clone());
        self.sender = Some(events);
        Ok(())
    }

    fn stop(&mut self) {
        self.sender = None;
    }
}
