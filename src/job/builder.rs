//! Raw request validation

use super::spec::{JobSpec, MediaKind};
use crate::utils::error::VidloaderError;
use tracing::debug;

/// Validate a raw (URL, format choice) pair and produce a primary job spec.
///
/// The URL is trimmed and must be non-empty; the format choice must be
/// `video` or `audio` (case-insensitive). Nothing else is checked here:
/// whether the URL actually resolves to media is the engine's call.
pub fn build_job(raw_url: &str, raw_format: &str) -> Result<JobSpec, VidloaderError> {
    let url = raw_url.trim();
    if url.is_empty() {
        return Err(VidloaderError::InvalidRequest("URL is required".to_string()));
    }

    let media_kind: MediaKind = raw_format
        .parse()
        .map_err(VidloaderError::InvalidRequest)?;

    let spec = JobSpec::primary(url.to_string(), media_kind);
    debug!("Built job {} ({}) for {}", spec.id(), media_kind, url);
    Ok(spec)
}
