//! Snapshot persistence for the interview flow.
//!
//! The store is a passive key/value resource shared by the proctoring
//! session and the controller. Each writes partial snapshots, so every write
//! is a merge over the previous value: fields a writer does not mention are
//! left alone and the last write wins for fields it does.
//!
//! # File Format
//!
//! One JSON object per key (`<dir>/<key>.json`), camelCase fields:
//!
//! ```json
//! {
//!   "resume": { "fullName": "...", "skills": ["Rust"] },
//!   "technicalQuestions": [ { "id": "q1", "question": "...", "type": "coding" } ],
//!   "isProctoringActive": true,
//!   "violationCount": 2,
//!   "timestamp": 1767225600000
//! }
//! ```
//!
//! # Defensive Design
//!
//! - Empty files, corrupt JSON and snapshots with mismatched fields load as
//!   absent (logged), never as errors
//! - Writes go through a temp file + rename so a crash can't leave half a snapshot

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::StoreError;
use crate::session::SessionStatus;
use crate::types::{CandidateProfile, CodeSubmission, ConversationTurn, Language, Question};

pub trait SessionStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn save(&mut self, key: &str, value: &Value) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Snapshot schema
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything the interview flow persists under one key.
///
/// Doubles as a patch: `None` fields are skipped on serialization, so a
/// value with only a few fields set merges just those fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredInterview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<CandidateProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_questions: Option<Vec<Question>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    /// Millisecond timestamp of the last write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_proctoring_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_submissions: Option<Vec<CodeSubmission>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<Vec<ConversationTurn>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<String>,
    /// Session duration in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions_completed: Option<usize>,
}

/// Fields describing one session's progress and outcome. Cleared when a new
/// session starts so a stale outcome can't leak into the next report.
pub const SESSION_FIELDS: &[&str] = &[
    "sessionId",
    "status",
    "startedAt",
    "endedAt",
    "currentQuestionIndex",
    "totalQuestions",
    "codeSubmissions",
    "conversation",
    "isCompleted",
    "terminationReason",
    "duration",
    "questionsCompleted",
    "violationCount",
];

/// Merges `patch` into the object stored at `key` and stamps `timestamp`.
pub fn merge_snapshot(
    store: &mut dyn SessionStore,
    key: &str,
    patch: &StoredInterview,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let mut merged = load_object(&*store, key)?;

    let patch_value = serde_json::to_value(patch).map_err(|source| StoreError::Json {
        context: format!("serializing patch for {}", key),
        source,
    })?;
    if let Value::Object(fields) = patch_value {
        for (field, value) in fields {
            merged.insert(field, value);
        }
    }
    merged.insert("timestamp".to_string(), Value::from(now.timestamp_millis()));

    store.save(key, &Value::Object(merged))
}

fn load_object(store: &dyn SessionStore, key: &str) -> Result<Map<String, Value>, StoreError> {
    match store.load(key)? {
        Some(Value::Object(fields)) => Ok(fields),
        Some(other) => {
            warn!(
                key = %key,
                kind = json_kind(&other),
                "Stored snapshot is not an object, replacing it"
            );
            Ok(Map::new())
        }
        None => Ok(Map::new()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A [`SessionStore`] bound to the interview snapshot key.
pub struct InterviewStore<S: SessionStore> {
    backend: S,
    key: String,
}

impl<S: SessionStore> InterviewStore<S> {
    pub fn new(backend: S, key: &str) -> Self {
        Self {
            backend,
            key: key.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Decodes the stored snapshot. One whose fields have the wrong shape
    /// loads as absent, the same as a corrupt file.
    pub fn load_snapshot(&self) -> Result<Option<StoredInterview>, StoreError> {
        let Some(value) = self.backend.load(&self.key)? else {
            return Ok(None);
        };

        match serde_json::from_value(value) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                warn!(
                    key = %self.key,
                    error = %err,
                    "Stored snapshot has an unexpected shape, treating as absent"
                );
                Ok(None)
            }
        }
    }

    pub fn merge(&mut self, patch: &StoredInterview, now: DateTime<Utc>) -> Result<(), StoreError> {
        merge_snapshot(&mut self.backend, &self.key, patch, now)
    }

    /// Drops per-session fields, keeping resume, questions and feedback.
    pub fn clear_session_fields(&mut self, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut fields = load_object(&self.backend, &self.key)?;
        for field in SESSION_FIELDS {
            fields.remove(*field);
        }
        fields.insert("timestamp".to_string(), Value::from(now.timestamp_millis()));
        self.backend.save(&self.key, &Value::Object(fields))
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.backend.remove(&self.key)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Backends
// ═══════════════════════════════════════════════════════════════════════════════

/// In-process store. Writes can be switched off to exercise persistence failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
    reject_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        if self.reject_writes {
            return Err(StoreError::WriteRejected {
                key: key.to_string(),
            });
        }
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.reject_writes {
            return Err(StoreError::WriteRejected {
                key: key.to_string(),
            });
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SessionStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key);
        let content = match fs_err::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    context: format!("reading {}", path.display()),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            warn!(path = %path.display(), "Empty snapshot file, treating as absent");
            return Ok(None);
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to parse snapshot file, treating as absent"
                );
                Ok(None)
            }
        }
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key);
        fs_err::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            context: format!("creating {}", self.dir.display()),
            source,
        })?;

        let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            context: format!("serializing {}", key),
            source,
        })?;

        let io_err = |context: &str, source: std::io::Error| StoreError::Io {
            context: format!("{} {}", context, path.display()),
            source,
        };
        let mut temp_file =
            NamedTempFile::new_in(&self.dir).map_err(|e| io_err("creating temp file for", e))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| io_err("writing temp file for", e))?;
        temp_file
            .flush()
            .map_err(|e| io_err("flushing temp file for", e))?;
        temp_file
            .persist(&path)
            .map_err(|e| io_err("replacing", e.error))?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs_err::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                context: format!("removing {}", path.display()),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_merge_keeps_fields_owned_by_other_writers() {
        let mut store = MemoryStore::new();
        let now = Utc::now();

        merge_snapshot(
            &mut store,
            "k",
            &StoredInterview {
                code: Some("fn main() {}".to_string()),
                current_question_index: Some(2),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        merge_snapshot(
            &mut store,
            "k",
            &StoredInterview {
                violation_count: Some(1),
                is_proctoring_active: Some(true),
                ..Default::default()
            },
            now,
        )
        .unwrap();

        let value = store.get("k").unwrap();
        assert_eq!(value["code"], json!("fn main() {}"));
        assert_eq!(value["currentQuestionIndex"], json!(2));
        assert_eq!(value["violationCount"], json!(1));
        assert_eq!(value["isProctoringActive"], json!(true));
        assert_eq!(value["timestamp"], json!(now.timestamp_millis()));
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        for count in [1, 2, 3] {
            merge_snapshot(
                &mut store,
                "k",
                &StoredInterview {
                    violation_count: Some(count),
                    ..Default::default()
                },
                now,
            )
            .unwrap();
        }
        assert_eq!(store.get("k").unwrap()["violationCount"], json!(3));
    }

    #[test]
    fn test_merge_preserves_unknown_fields() {
        let mut store = MemoryStore::new();
        store
            .save("k", &json!({ "startingText": "hi", "violationCount": 2 }))
            .unwrap();

        merge_snapshot(
            &mut store,
            "k",
            &StoredInterview {
                is_completed: Some(true),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();

        let value = store.get("k").unwrap();
        assert_eq!(value["startingText"], json!("hi"));
        assert_eq!(value["violationCount"], json!(2));
        assert_eq!(value["isCompleted"], json!(true));
    }

    #[test]
    fn test_merge_replaces_non_object_snapshot() {
        let mut store = MemoryStore::new();
        store.save("k", &json!([1, 2, 3])).unwrap();
        merge_snapshot(
            &mut store,
            "k",
            &StoredInterview {
                code: Some(String::new()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert!(store.get("k").unwrap().is_object());
    }

    #[test]
    fn test_clear_session_fields_keeps_inputs() {
        let mut store = InterviewStore::new(MemoryStore::new(), "k");
        let now = Utc::now();
        store
            .merge(
                &StoredInterview {
                    resume: Some(CandidateProfile {
                        full_name: "Ada".to_string(),
                        ..Default::default()
                    }),
                    is_completed: Some(true),
                    termination_reason: Some("completed".to_string()),
                    violation_count: Some(4),
                    ..Default::default()
                },
                now,
            )
            .unwrap();

        store.clear_session_fields(now).unwrap();
        let snapshot = store.load_snapshot().unwrap().unwrap();
        assert_eq!(snapshot.resume.unwrap().full_name, "Ada");
        assert_eq!(snapshot.is_completed, None);
        assert_eq!(snapshot.termination_reason, None);
        assert_eq!(snapshot.violation_count, None);
    }

    #[test]
    fn test_mismatched_snapshot_loads_as_absent() {
        let mut backend = MemoryStore::new();
        backend
            .save(
                "k",
                &json!({
                    "technicalQuestions": [
                        { "Question": "Reverse a list", "TestCase": "[1,2]", "Output": "[2,1]" }
                    ],
                    "violationCount": 2
                }),
            )
            .unwrap();

        let store = InterviewStore::new(backend, "k");
        assert!(store.load_snapshot().unwrap().is_none());
        assert_eq!(
            store.backend().get("k").unwrap()["violationCount"],
            json!(2)
        );
    }

    #[test]
    fn test_rejected_writes_surface_as_errors() {
        let mut store = MemoryStore::new();
        store.set_reject_writes(true);
        let err =
            merge_snapshot(&mut store, "k", &StoredInterview::default(), Utc::now()).unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected { .. }));
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp = tempdir().unwrap();
        let mut store = FileStore::new(&temp.path().join("nested"));
        let value = json!({ "code": "x" });
        store.save("interview_data", &value).unwrap();

        let reopened = FileStore::new(&temp.path().join("nested"));
        assert_eq!(reopened.load("interview_data").unwrap(), Some(value));
    }

    #[test]
    fn test_file_store_missing_file_is_absent() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());
        assert_eq!(store.load("nothing").unwrap(), None);
    }

    #[test]
    fn test_file_store_empty_file_is_absent() {
        let temp = tempdir().unwrap();
        fs_err::write(temp.path().join("k.json"), "").unwrap();
        let store = FileStore::new(temp.path());
        assert_eq!(store.load("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_corrupt_file_is_absent() {
        let temp = tempdir().unwrap();
        fs_err::write(temp.path().join("k.json"), "{invalid json}").unwrap();
        let store = FileStore::new(temp.path());
        assert_eq!(store.load("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_remove_is_idempotent() {
        let temp = tempdir().unwrap();
        let mut store = FileStore::new(temp.path());
        store.save("k", &json!({})).unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.load("k").unwrap(), None);
    }
}
