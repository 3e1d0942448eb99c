//! Error types for Vidlens.

use crate::embedding::BatchError;
use crate::rate_limit::RateLimitExceeded;
use thiserror::Error;

/// Library-level error type for Vidlens operations.
#[derive(Error, Debug)]
pub enum VidlensError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("No transcript available for video {0}")]
    TranscriptUnavailable(String),

    #[error("Media download failed: {0}")]
    MediaDownload(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Embedding integrity check failed: {0}")]
    Batch(#[from] BatchError),

    #[error("{0}")]
    RateLimited(#[from] RateLimitExceeded),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Video store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Gemini API error: {0}")]
    Gemini(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),
}

impl VidlensError {
    /// Whether the caller may retry the same request after backing off.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VidlensError::RateLimited(_) | VidlensError::Http(_))
    }
}

/// Result type alias for Vidlens operations.
pub type Result<T> = std::result::Result<T, VidlensError>;
