//! Application configuration

use crate::orchestrator::TimeoutPolicy;
use crate::utils::error::VidloaderError;
use crate::utils::platform;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

pub const ENV_OUTPUT_DIR: &str = "VIDLOADER_OUTPUT_DIR";
pub const ENV_YTDLP_PATH: &str = "VIDLOADER_YTDLP_PATH";
pub const ENV_FFMPEG_PATH: &str = "VIDLOADER_FFMPEG_PATH";
pub const ENV_MAX_CONCURRENT: &str = "VIDLOADER_MAX_CONCURRENT";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Staging directory for engine output
    pub output_dir: PathBuf,

    /// Explicit yt-dlp binary; discovered when unset
    pub ytdlp_path: Option<PathBuf>,

    /// Transcoder binary or its directory, handed to the engine
    pub ffmpeg_location: Option<PathBuf>,

    /// Concurrent extractions. Always 1: extraction is single-flight.
    pub max_concurrent: usize,

    /// Per-job deadlines
    pub timeouts: TimeoutPolicy,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            output_dir: platform::default_output_dir(),
            ytdlp_path: None,
            ffmpeg_location: None,
            max_concurrent: 1,
            timeouts: TimeoutPolicy::default(),
        }
    }
}

impl AppSettings {
    /// Defaults overlaid with `VIDLOADER_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppSettings::from_env`] with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty(ENV_OUTPUT_DIR) {
            settings.output_dir = PathBuf::from(dir);
        }
        if let Some(path) = non_empty(ENV_YTDLP_PATH) {
            settings.ytdlp_path = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty(ENV_FFMPEG_PATH) {
            settings.ffmpeg_location = Some(PathBuf::from(path));
        }
        if let Some(raw) = non_empty(ENV_MAX_CONCURRENT) {
            match raw.trim().parse::<usize>() {
                Ok(n) => settings.max_concurrent = n,
                Err(_) => warn!("Ignoring non-numeric {}={}", ENV_MAX_CONCURRENT, raw),
            }
        }

        settings.normalized()
    }

    /// Enforce sane values
    pub fn normalized(mut self) -> Self {
        if self.max_concurrent != 1 {
            warn!(
                "max_concurrent={} requested, but extraction is single-flight; using 1",
                self.max_concurrent
            );
            self.max_concurrent = 1;
        }
        self
    }

    /// Create the staging directory if needed
    pub async fn ensure_output_dir(&self) -> Result<(), VidloaderError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(VidloaderError::Config("output directory is empty".to_string()));
        }
        tokio::fs::create_dir_all(&self.output_dir).await?;
        info!("Staging directory: {}", self.output_dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppSettings::default();
        assert_eq!(config.max_concurrent, 1);
        assert!(config.ytdlp_path.is_none());
        assert_eq!(config.timeouts, TimeoutPolicy::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppSettings::from_lookup(lookup(&[
            (ENV_OUTPUT_DIR, "/srv/vidloader"),
            (ENV_YTDLP_PATH, "/opt/yt-dlp"),
            (ENV_FFMPEG_PATH, "/opt/ffmpeg/bin"),
        ]));

        assert_eq!(config.output_dir, PathBuf::from("/srv/vidloader"));
        assert_eq!(config.ytdlp_path, Some(PathBuf::from("/opt/yt-dlp")));
        assert_eq!(config.ffmpeg_location, Some(PathBuf::from("/opt/ffmpeg/bin")));
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let config = AppSettings::from_lookup(lookup(&[(ENV_YTDLP_PATH, "  ")]));
        assert!(config.ytdlp_path.is_none());
    }

    #[test]
    fn test_concurrency_clamped_to_one() {
        for raw in ["4", "0", "lots"] {
            let config = AppSettings::from_lookup(lookup(&[(ENV_MAX_CONCURRENT, raw)]));
            assert_eq!(config.max_concurrent, 1);
        }
    }

    #[tokio::test]
    async fn test_ensure_output_dir_creates_nested() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = AppSettings {
            output_dir: temp.path().join("a").join("b"),
            ..Default::default()
        };

        config.ensure_output_dir().await.unwrap();
        assert!(config.output_dir.is_dir());
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = AppSettings::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.output_dir, config.output_dir);
        assert_eq!(back.timeouts, config.timeouts);
    }
}
