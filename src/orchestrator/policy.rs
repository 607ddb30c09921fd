//! Per-job deadline computation

use crate::job::{Attempt, JobSpec, MediaKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hosts whose audio jobs are known to take longer to process.
/// Matched against the URL host and any of its subdomains.
pub const SLOW_PLATFORM_HOSTS: &[&str] = &["youtube.com", "youtu.be"];

/// Maximum wall-clock time allowed for one engine invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
    #[serde(with = "secs")]
    pub video: Duration,
    #[serde(with = "secs")]
    pub audio: Duration,
    /// Primary audio attempt from a slow platform
    #[serde(with = "secs")]
    pub audio_slow_platform: Duration,
    /// No transcoding step, so shorter
    #[serde(with = "secs")]
    pub audio_fallback: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            video: Duration::from_secs(300),
            audio: Duration::from_secs(300),
            audio_slow_platform: Duration::from_secs(600),
            audio_fallback: Duration::from_secs(180),
        }
    }
}

impl TimeoutPolicy {
    /// Deadline for `spec`
    pub fn timeout_for(&self, spec: &JobSpec) -> Duration {
        match (spec.media_kind(), spec.attempt()) {
            (MediaKind::Video, _) => self.video,
            (MediaKind::Audio, Attempt::Fallback) => self.audio_fallback,
            (MediaKind::Audio, Attempt::Primary) => {
                if is_slow_platform(spec.source_host().as_deref()) {
                    self.audio_slow_platform
                } else {
                    self.audio
                }
            }
        }
    }
}

fn is_slow_platform(host: Option<&str>) -> bool {
    let Some(host) = host else {
        return false;
    };

    SLOW_PLATFORM_HOSTS.iter().any(|slow| {
        host == *slow
            || host
                .strip_suffix(slow)
                .is_some_and(|rest| rest.ends_with('.'))
    })
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
