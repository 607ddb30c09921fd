//! Platform-specific utilities for Vidloader
//!
//! Directory defaults and external tool availability.

use crate::extractor::ytdlp::{find_ffmpeg, find_ytdlp};
use std::path::{Path, PathBuf};

/// Returns the default staging directory
/// - macOS: ~/Library/Caches/vidloader/downloads
/// - Windows: %LOCALAPPDATA%\vidloader\downloads
/// - Linux: ~/.cache/vidloader/downloads
/// - Anywhere else: ./downloads
pub fn default_output_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("vidloader").join("downloads"))
        .unwrap_or_else(|| PathBuf::from("downloads"))
}

/// Where the external tools were found
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolReport {
    pub ytdlp: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
}

impl ToolReport {
    /// Resolve tools, honouring explicit configuration first
    pub fn discover(ytdlp: Option<&Path>, ffmpeg: Option<&Path>) -> Self {
        Self {
            ytdlp: ytdlp.map(Path::to_path_buf).or_else(find_ytdlp),
            ffmpeg: ffmpeg.map(Path::to_path_buf).or_else(find_ffmpeg),
        }
    }

    /// Audio jobs still succeed without ffmpeg, via the raw-audio fallback
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.ytdlp.is_none() {
            warnings.push(
                "yt-dlp not found; install it with `pip install yt-dlp` or `brew install yt-dlp`"
                    .to_string(),
            );
        }
        if self.ffmpeg.is_none() {
            warnings.push(
                "ffmpeg not found; audio will be delivered in its original container".to_string(),
            );
        }
        warnings
    }
}
