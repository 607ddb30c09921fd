//! Declarative option bundles handed to the extraction engine

use crate::job::{Attempt, JobId, JobSpec, MediaKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder the engine substitutes with the container extension it
/// actually produced.
pub const EXT_PLACEHOLDER: &str = "%(ext)s";

/// Prefer an mp4 video + m4a audio pair, then any mp4, then anything.
pub const VIDEO_SELECTOR: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

/// Best pure-audio stream, else the best combined stream.
pub const AUDIO_SELECTOR: &str = "bestaudio/best";

/// Target bitrate of the primary audio pipeline, in kbps
pub const AUDIO_QUALITY_KBPS: u32 = 192;

/// Lossy codec the primary audio pipeline transcodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Mp3,
}

impl AudioCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioCodec::Mp3 => "mp3",
        }
    }

    /// File extension of the transcoded output
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

/// Encoder speed/size trade-off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingPreset {
    Fastest,
}

impl EncodingPreset {
    /// Value passed to the transcoder's `-preset` option
    pub fn as_transcoder_value(&self) -> &'static str {
        match self {
            EncodingPreset::Fastest => "ultrafast",
        }
    }
}

/// Transcoding step run after the download
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcessing {
    pub codec: AudioCodec,
    pub quality_kbps: u32,
}

/// Resource caps for the post-processing step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub threads: u32,
    pub preset: EncodingPreset,
}

impl ResourceLimits {
    /// Render as raw transcoder arguments
    pub fn to_transcoder_args(&self) -> Vec<String> {
        vec![
            "-threads".to_string(),
            self.threads.to_string(),
            "-preset".to_string(),
            self.preset.as_transcoder_value().to_string(),
        ]
    }
}

/// Everything the engine needs for one invocation.
///
/// Built right before each executor call and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOptions {
    pub job_id: JobId,
    /// `<output_dir>/<job id>.%(ext)s`
    pub output_template: String,
    pub format_selector: String,
    pub post_processing: Option<PostProcessing>,
    pub post_processor_limits: Option<ResourceLimits>,
    /// Only ever extract the single item the URL points at
    pub single_item: bool,
    /// Keep engine chatter off stderr so failures carry only the error text
    pub quiet: bool,
}

impl ExtractionOptions {
    /// Path the engine will write when it produces a container with `ext`.
    pub fn output_path_for(&self, ext: &str) -> PathBuf {
        PathBuf::from(self.output_template.replace(EXT_PLACEHOLDER, ext))
    }
}

/// Compile a job spec into the engine's option bundle. Pure.
pub fn compile_options(spec: &JobSpec, output_dir: &Path) -> ExtractionOptions {
    let output_template = output_dir
        .join(format!("{}.{}", spec.id(), EXT_PLACEHOLDER))
        .to_string_lossy()
        .into_owned();

    let (format_selector, post_processing, post_processor_limits) =
        match (spec.media_kind(), spec.attempt()) {
            (MediaKind::Video, _) => (VIDEO_SELECTOR, None, None),
            (MediaKind::Audio, Attempt::Primary) => (
                AUDIO_SELECTOR,
                Some(PostProcessing {
                    codec: AudioCodec::Mp3,
                    quality_kbps: AUDIO_QUALITY_KBPS,
                }),
                Some(ResourceLimits {
                    threads: 1,
                    preset: EncodingPreset::Fastest,
                }),
            ),
            // Raw container, no transcoder involved
            (MediaKind::Audio, Attempt::Fallback) => (AUDIO_SELECTOR, None, None),
        };

    ExtractionOptions {
        job_id: spec.id().clone(),
        output_template,
        format_selector: format_selector.to_string(),
        post_processing,
        post_processor_limits,
        single_item: true,
        quiet: true,
    }
}
