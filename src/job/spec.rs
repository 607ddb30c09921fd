//! Immutable job descriptors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Process-unique job identifier.
///
/// Doubles as the base filename of everything the engine stages for the
/// job, and as the correlation key in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the caller wants back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let choice = s.trim();
        if choice.eq_ignore_ascii_case("video") {
            Ok(MediaKind::Video)
        } else if choice.eq_ignore_ascii_case("audio") {
            Ok(MediaKind::Audio)
        } else {
            Err(format!(
                "unrecognized format '{}', expected 'video' or 'audio'",
                choice
            ))
        }
    }
}

/// Which extraction strategy a job spec describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attempt {
    Primary,
    Fallback,
}

/// One validated job. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    id: JobId,
    source_url: String,
    media_kind: MediaKind,
    attempt: Attempt,
    created_at: DateTime<Utc>,
}

impl JobSpec {
    /// Create a primary-attempt spec. Callers outside this module go through
    /// [`super::build_job`], which validates the raw input first.
    pub(crate) fn primary(source_url: String, media_kind: MediaKind) -> Self {
        Self {
            id: JobId::new(),
            source_url,
            media_kind,
            attempt: Attempt::Primary,
            created_at: Utc::now(),
        }
    }

    /// Derive the fallback spec: same id, URL and kind, `Attempt::Fallback`.
    pub fn to_fallback(&self) -> JobSpec {
        JobSpec {
            attempt: Attempt::Fallback,
            ..self.clone()
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Host component of the source URL, lowercased, if it parses
    pub fn source_host(&self) -> Option<String> {
        url::Url::parse(&self.source_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
    }
}
