//! Error handling for Vidloader

use thiserror::Error;

/// Infrastructure error type for Vidloader
///
/// Job outcomes are reported through [`crate::orchestrator::JobFailure`];
/// this type covers everything around them (tool discovery, staging
/// directory, configuration).
#[derive(Debug, Error)]
pub enum VidloaderError {
    #[error("yt-dlp not found. Please install yt-dlp")]
    YtDlpNotFound,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
