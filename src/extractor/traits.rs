use crate::extractor::options::ExtractionOptions;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Failure raised by an extraction engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine ran and reported a typed extraction failure. The message
    /// is the engine's own text; it is what the classifier inspects.
    #[error("{0}")]
    Extraction(String),

    /// The engine could not be started or talked to at all
    #[error("engine launch failed: {0}")]
    Launch(#[from] std::io::Error),

    /// The engine stopped because the cancellation token fired
    #[error("extraction cancelled")]
    Cancelled,
}

/// Core trait for the external media-retrieval engine
///
/// This trait isolates the orchestrator from the concrete engine (yt-dlp
/// subprocess, test fakes). Implementations are synchronous and may block
/// for a long time; the executor always calls them from a blocking thread.
pub trait ExtractionEngine: Send + Sync {
    /// Returns a short identifier for logs (e.g. "yt-dlp")
    fn id(&self) -> &'static str;

    /// Fetch (and optionally transcode) `url` according to `options`.
    ///
    /// Cancellation is best-effort: engines that can abort should watch
    /// `cancel` and return [`EngineError::Cancelled`] once it fires.
    fn execute(
        &self,
        url: &str,
        options: &ExtractionOptions,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError>;
}
