pub mod options;
pub mod traits;
pub mod ytdlp;

pub use options::{compile_options, ExtractionOptions, PostProcessing, ResourceLimits};
pub use traits::{EngineError, ExtractionEngine};
pub use ytdlp::YtDlpEngine;
