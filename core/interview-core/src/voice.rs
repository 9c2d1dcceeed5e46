//! Interface to the external voice-interview service.
//!
//! The service runs the spoken half of the interview. We hand it a
//! [`SessionContext`] on start and it reports back over an mpsc channel:
//! transcript lines as they arrive, and a final [`VoiceEvent::CallEnded`]
//! when its own silence/idle/duration limits hang up the call.

use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};

use crate::config::VoiceConfig;
use crate::error::VoiceError;
use crate::types::{CandidateProfile, Question};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub candidate_name: String,
    pub candidate_email: String,
    pub candidate_experience: String,
    pub candidate_education: String,
    pub candidate_skills: String,
    pub candidate_code: String,
    pub technical_questions: String,
    pub first_message: String,
    pub end_call_message: String,
    pub silence_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub max_duration_seconds: u64,
    pub silence_timeout_message: String,
}

impl SessionContext {
    pub fn build(
        profile: &CandidateProfile,
        questions: &[Question],
        code: &str,
        config: &VoiceConfig,
    ) -> Self {
        Self {
            candidate_name: profile.full_name.clone(),
            candidate_email: profile.email.clone(),
            candidate_experience: profile.experience.clone(),
            candidate_education: profile.education.clone(),
            candidate_skills: profile.skills_list(),
            candidate_code: code.to_string(),
            technical_questions: format_questions(questions),
            first_message: opening_prompt(profile),
            end_call_message: config.end_call_message.clone(),
            silence_timeout_seconds: config.silence_timeout_secs,
            idle_timeout_seconds: config.idle_timeout_secs,
            max_duration_seconds: config.max_duration_secs,
            silence_timeout_message: config.silence_timeout_message.clone(),
        }
    }
}

/// "Q1: ...\nQ2: ..." as read out by the interviewer.
pub fn format_questions(questions: &[Question]) -> String {
    questions
        .iter()
        .enumerate()
        .map(|(index, question)| format!("Q{}: {}", index + 1, question.question))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn opening_prompt(profile: &CandidateProfile) -> String {
    let mut prompt = format!(
        "Hi {}! I'm your AI technical interviewer. ",
        profile.full_name
    );
    if !profile.skills.is_empty() {
        prompt.push_str(&format!(
            "I can see you have experience in {}. ",
            profile.skills_list()
        ));
    }
    prompt.push_str(
        "I'll be conducting a technical interview based on your background and the following \
         assessment. Let's begin - could you briefly tell me about yourself?",
    );
    prompt
}

/// Why the voice service hung up on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallEndReason {
    SilenceTimeout,
    IdleTimeout,
    MaxDuration,
    RemoteHangup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VoiceEvent {
    Message { text: String },
    CallEnded { reason: CallEndReason },
    Error { message: String },
}

pub trait VoiceClient {
    /// Connects and begins the call. Events flow into `events` until `stop`.
    fn start(&mut self, context: &SessionContext, events: Sender<VoiceEvent>)
        -> Result<(), VoiceError>;

    fn stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CandidateProfile {
        CandidateProfile {
            full_name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            experience: "Compilers".to_string(),
            education: "Yale".to_string(),
            skills: vec!["COBOL".to_string(), "Rust".to_string()],
        }
    }

    #[test]
    fn test_format_questions_numbers_from_one() {
        let questions = vec![
            Question::verbal("a", "Why Rust?"),
            Question::coding("b", "Reverse a linked list"),
        ];
        assert_eq!(
            format_questions(&questions),
            "Q1: Why Rust?\nQ2: Reverse a linked list"
        );
    }

    #[test]
    fn test_opening_prompt_mentions_name_and_skills() {
        let prompt = opening_prompt(&profile());
        assert!(prompt.starts_with("Hi Grace Hopper!"));
        assert!(prompt.contains("COBOL, Rust"));
    }

    #[test]
    fn test_context_carries_limits_and_code() {
        let config = VoiceConfig::default();
        let context = SessionContext::build(
            &profile(),
            &[Question::verbal("a", "Why Rust?")],
            "print(1)",
            &config,
        );
        assert_eq!(context.candidate_code, "print(1)");
        assert_eq!(context.candidate_skills, "COBOL, Rust");
        assert_eq!(context.silence_timeout_seconds, 30);
        assert_eq!(context.max_duration_seconds, 1800);
        assert_eq!(context.idle_timeout_seconds, 10);
        assert_eq!(context.technical_questions, "Q1: Why Rust?");
    }

    #[test]
    fn test_voice_event_wire_format() {
        let event: VoiceEvent =
            serde_json::from_str(r#"{"type":"call_ended","reason":"max_duration"}"#).unwrap();
        assert_eq!(
            event,
            VoiceEvent::CallEnded {
                reason: CallEndReason::MaxDuration
            }
        );
    }
}
