//! Vidloader library
//!
//! Turns a media URL plus a `video`/`audio` choice into a delivered file,
//! one extraction at a time.

pub mod delivery;
pub mod extractor;
pub mod job;
pub mod orchestrator;
pub mod utils;

// Re-export main types for easier use
pub use delivery::{DeliveredFile, DeliveryStream};
pub use extractor::{EngineError, ExtractionEngine, ExtractionOptions, YtDlpEngine};
pub use job::{build_job, Attempt, JobId, JobSpec, MediaKind};
pub use orchestrator::{ErrorCategory, ExecutionOutcome, JobFailure, Orchestrator, TimeoutPolicy};
pub use utils::{AppSettings, VidloaderError};
