//! Engine failure text → error category
//!
//! The engine reports failures as unstructured text, so classification is an
//! ordered list of lowercase substring rules; the first rule that matches
//! wins. The order matters: a message mentioning both the transcoder and a
//! login wall is a transcoder problem.

use super::outcome::ErrorCategory;

const RULES: &[(&[&str], ErrorCategory)] = &[
    (&["ffmpeg", "ffprobe"], ErrorCategory::MissingTranscoder),
    (&["sign in", "login"], ErrorCategory::LoginRequired),
    (&["geo-restricted"], ErrorCategory::GeoRestricted),
    (&["not available", "unavailable"], ErrorCategory::Unavailable),
];

/// Classify a raw extraction failure message
pub fn classify_message(message: &str) -> ErrorCategory {
    let lowered = message.to_lowercase();

    RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lowered.contains(n)))
        .map(|(_, category)| *category)
        .unwrap_or(ErrorCategory::Unknown)
}
