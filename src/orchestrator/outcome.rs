//! Execution outcomes and the caller-facing failure taxonomy

use crate::utils::error::VidloaderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Closed set of failure categories a job can end with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Caller error, never retried
    InvalidRequest,
    /// Transcoder missing; triggers the audio fallback once
    MissingTranscoder,
    LoginRequired,
    GeoRestricted,
    Unavailable,
    Timeout,
    /// The raw-audio fallback failed after a missing transcoder
    FallbackFailed,
    Unknown,
}

/// How a presentation layer should treat a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    ClientError,
    DeadlineExceeded,
    NotFound,
    ServerError,
}

impl ErrorCategory {
    pub fn status_class(&self) -> StatusClass {
        match self {
            ErrorCategory::InvalidRequest
            | ErrorCategory::LoginRequired
            | ErrorCategory::GeoRestricted => StatusClass::ClientError,
            ErrorCategory::Timeout => StatusClass::DeadlineExceeded,
            ErrorCategory::Unavailable => StatusClass::NotFound,
            ErrorCategory::MissingTranscoder
            | ErrorCategory::FallbackFailed
            | ErrorCategory::Unknown => StatusClass::ServerError,
        }
    }

    /// Conventional HTTP status for the category
    pub fn http_status(&self) -> u16 {
        match self.status_class() {
            StatusClass::ClientError => 400,
            StatusClass::DeadlineExceeded => 504,
            StatusClass::NotFound => 404,
            StatusClass::ServerError => 500,
        }
    }

    /// Stable user-facing message
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidRequest => "The request is missing a URL or uses an unknown format",
            ErrorCategory::MissingTranscoder => {
                "The server is missing its audio transcoder (ffmpeg)"
            }
            ErrorCategory::LoginRequired => "This media requires signing in to the source site",
            ErrorCategory::GeoRestricted => "This media is not available in the server's region",
            ErrorCategory::Unavailable => "This media is unavailable or has been removed",
            ErrorCategory::Timeout => {
                "Download timed out. Please try a shorter video or check the URL"
            }
            ErrorCategory::FallbackFailed => {
                "Audio extraction failed, and the raw-audio fallback failed too"
            }
            ErrorCategory::Unknown => "An unexpected error occurred",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::InvalidRequest => "invalid_request",
            ErrorCategory::MissingTranscoder => "missing_transcoder",
            ErrorCategory::LoginRequired => "login_required",
            ErrorCategory::GeoRestricted => "geo_restricted",
            ErrorCategory::Unavailable => "unavailable",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::FallbackFailed => "fallback_failed",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure surfaced to the caller
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{category}: {message}")]
pub struct JobFailure {
    pub category: ErrorCategory,
    /// Raw detail (engine text, validation message)
    pub message: String,
}

impl JobFailure {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl From<VidloaderError> for JobFailure {
    fn from(err: VidloaderError) -> Self {
        match err {
            VidloaderError::InvalidRequest(message) => {
                JobFailure::new(ErrorCategory::InvalidRequest, message)
            }
            other => JobFailure::new(ErrorCategory::Unknown, other.to_string()),
        }
    }
}

/// Result of exactly one executor invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success { output_path: PathBuf },
    Failure(JobFailure),
}

impl ExecutionOutcome {
    pub fn failure(category: ErrorCategory, message: impl Into<String>) -> Self {
        ExecutionOutcome::Failure(JobFailure::new(category, message))
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            ExecutionOutcome::Success { .. } => None,
            ExecutionOutcome::Failure(f) => Some(f.category),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }
}
