//! Utility modules for error handling, configuration and platform lookups

pub mod config;
pub mod error;
pub mod platform;

// Re-export for convenience
pub use config::AppSettings;
pub use error::VidloaderError;
pub use platform::{default_output_dir, ToolReport};
