use interview_core::{ConfigError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Script line {line}: {details}")]
    Script { line: usize, details: String },

    #[error("IO error {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error {context}: {source}")]
    Encode {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
