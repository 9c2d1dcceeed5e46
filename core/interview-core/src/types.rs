//! Candidate, question and submission types shared across the crate.
//!
//! Field names serialize as camelCase so snapshots stay readable by the
//! report view that consumes the same store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resume fields extracted before the interview starts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl CandidateProfile {
    pub fn skills_list(&self) -> String {
        self.skills.join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    #[default]
    Verbal,
    Coding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub question: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_case: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Question {
    pub fn verbal(id: &str, question: &str) -> Self {
        Self {
            id: id.to_string(),
            question: question.to_string(),
            kind: QuestionKind::Verbal,
            test_case: None,
            output: None,
        }
    }

    pub fn coding(id: &str, question: &str) -> Self {
        Self {
            kind: QuestionKind::Coding,
            ..Self::verbal(id, question)
        }
    }

    pub fn is_coding(&self) -> bool {
        self.kind == QuestionKind::Coding
    }
}

/// Editor languages offered for coding questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    JavaScript,
    TypeScript,
    Python,
    Java,
    Cpp,
    CSharp,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::JavaScript,
        Language::TypeScript,
        Language::Python,
        Language::Java,
        Language::Cpp,
        Language::CSharp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Python => "Python",
            Language::Java => "Java",
            Language::Cpp => "C++",
            Language::CSharp => "C#",
        }
    }

    pub fn from_id(value: &str) -> Option<Self> {
        Language::ALL
            .into_iter()
            .find(|language| language.as_str() == value)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code captured when the candidate moves past a coding question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSubmission {
    pub question_id: String,
    pub code: String,
    pub language: Language,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Interviewer,
    Candidate,
}

const INTERVIEWER_PREFIX: &str = "Interviewer:";

/// One line of the voice transcript, kept exactly as the voice client sent it.
///
/// The speaker is implied by the "Interviewer:" prefix; anything else is the
/// candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationTurn(String);

impl ConversationTurn {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn speaker(&self) -> Speaker {
        if self.0.trim_start().starts_with(INTERVIEWER_PREFIX) {
            Speaker::Interviewer
        } else {
            Speaker::Candidate
        }
    }

    /// Message body without the speaker prefix.
    pub fn text(&self) -> &str {
        let trimmed = self.0.trim_start();
        match trimmed.strip_prefix(INTERVIEWER_PREFIX) {
            Some(rest) => rest.trim_start(),
            None => trimmed,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
