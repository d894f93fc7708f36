//! Error types for tubesum.

use thiserror::Error;

/// Library-level error type for tubesum operations.
#[derive(Error, Debug)]
pub enum TubesumError {
    #[error("Invalid video reference: {0}")]
    InvalidReference(String),

    #[error("Transcript unavailable for {video_id}: {cause}")]
    TranscriptUnavailable { video_id: String, cause: String },

    #[error("Generation timed out after {0:?}")]
    GenerationTimeout(std::time::Duration),

    #[error("Generation provider error: {0}")]
    GenerationProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metadata lookup failed: {0}")]
    Metadata(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TubesumError {
    /// Whether this error aborts a run instead of degrading it.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            TubesumError::GenerationTimeout(_)
                | TubesumError::GenerationProvider(_)
                | TubesumError::Metadata(_)
        )
    }
}

/// Result type alias for tubesum operations.
pub type Result<T> = std::result::Result<T, TubesumError>;
