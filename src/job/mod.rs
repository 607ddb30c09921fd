pub mod builder;
pub mod spec;

pub use builder::build_job;
pub use spec::{Attempt, JobId, JobSpec, MediaKind};
