//! Configuration loading.
//!
//! Everything has a default, so a missing config file is not an error. The
//! file lives at `~/.mock-interview/config.toml` unless a path is given.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::violations::DEFAULT_VIOLATION_LIMIT;

pub const DEFAULT_STORE_KEY: &str = "interview_data";
pub const DEFAULT_END_CALL_MESSAGE: &str =
    "Thank you for your time! I will now process your responses and provide feedback.";
pub const DEFAULT_SILENCE_TIMEOUT_MESSAGE: &str =
    "Are you still there? Should we continue with the interview?";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProctoringConfig {
    /// Violations up to and including this count are warnings.
    pub violation_limit: u32,
    /// Outer window height below this share of the screen counts as minimized.
    pub resize_height_ratio: f64,
    /// Available screen width above this multiple of the inner width suggests a second monitor.
    pub multi_monitor_width_ratio: f64,
    /// Screen/window area mismatch above this share of the screen area is suspicious.
    pub screen_area_ratio: f64,
    pub screen_poll_secs: u64,
    /// Block question advancement while the camera is not active.
    pub require_camera: bool,
}

impl Default for ProctoringConfig {
    fn default() -> Self {
        Self {
            violation_limit: DEFAULT_VIOLATION_LIMIT,
            resize_height_ratio: 0.9,
            multi_monitor_width_ratio: 1.5,
            screen_area_ratio: 0.2,
            screen_poll_secs: 10,
            require_camera: true,
        }
    }
}

/// Limits handed to the voice client; it enforces them itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub silence_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_duration_secs: u64,
    pub end_call_message: String,
    pub silence_timeout_message: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            silence_timeout_secs: 30,
            idle_timeout_secs: 10,
            max_duration_secs: 1800,
            end_call_message: DEFAULT_END_CALL_MESSAGE.to_string(),
            silence_timeout_message: DEFAULT_SILENCE_TIMEOUT_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORE_KEY.to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewConfig {
    pub proctoring: ProctoringConfig,
    pub voice: VoiceConfig,
    pub store: StoreConfig,
}

/// Returns the app data directory (~/.mock-interview).
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".mock-interview"))
        .ok_or(ConfigError::HomeDirNotFound)
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    default_data_dir().map(|dir| dir.join("config.toml"))
}

/// Loads the config, returning defaults if the file doesn't exist.
pub fn load_config(path: Option<PathBuf>) -> Result<InterviewConfig, ConfigError> {
    let config_path = match path {
        Some(path) => path,
        None => default_config_path()?,
    };

    if !config_path.exists() {
        return Ok(InterviewConfig::default());
    }

    let content = fs_err::read_to_string(&config_path).map_err(|source| ConfigError::Io {
        context: format!("reading {}", config_path.display()),
        source,
    })?;
    toml::from_str::<InterviewConfig>(&content).map_err(|err| ConfigError::Malformed {
        path: config_path,
        details: err.to_string(),
    })
}

impl InterviewConfig {
    /// Directory for the file-backed store, falling back to `<data dir>/store`.
    pub fn store_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.store.dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir().map(|dir| dir.join("store")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_defaults_when_file_missing() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("missing.toml");
        let config = load_config(Some(path)).expect("load config");
        assert_eq!(config, InterviewConfig::default());
        assert_eq!(config.proctoring.violation_limit, 3);
        assert_eq!(config.store.key, "interview_data");
    }

    #[test]
    fn load_config_merges_partial_sections() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(
            &path,
            r#"
[proctoring]
violation_limit = 5
require_camera = false

[voice]
max_duration_secs = 600
"#,
        )
        .expect("write config");

        let config = load_config(Some(path)).expect("load config");
        assert_eq!(config.proctoring.violation_limit, 5);
        assert!(!config.proctoring.require_camera);
        assert_eq!(config.proctoring.screen_poll_secs, 10);
        assert_eq!(config.voice.max_duration_secs, 600);
        assert_eq!(config.voice.silence_timeout_secs, 30);
    }

    #[test]
    fn load_config_reports_malformed_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("config.toml");
        fs_err::write(&path, "[proctoring\nviolation_limit = ").expect("write config");

        let err = load_config(Some(path)).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn store_dir_prefers_explicit_setting() {
        let mut config = InterviewConfig::default();
        config.store.dir = Some(PathBuf::from("/tmp/interviews"));
        assert_eq!(
            config.store_dir().expect("store dir"),
            PathBuf::from("/tmp/interviews")
        );
    }
}
