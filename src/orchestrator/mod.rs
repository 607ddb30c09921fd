//! Download job orchestration
//!
//! Request → [`build_job`] → [`FallbackCoordinator`] (options compiler,
//! timeout policy, [`SingleFlightExecutor`], classifier) → [`DeliveredFile`]
//! or a categorized [`JobFailure`].

pub mod classify;
pub mod executor;
pub mod fallback;
pub mod outcome;
pub mod policy;

pub use classify::classify_message;
pub use executor::{single_slot, SingleFlightExecutor};
pub use fallback::{needs_fallback, AttemptReport, FallbackCoordinator};
pub use outcome::{ErrorCategory, ExecutionOutcome, JobFailure, StatusClass};
pub use policy::TimeoutPolicy;

use crate::delivery::{remove_job_files, DeliveredFile};
use crate::extractor::ExtractionEngine;
use crate::job::{build_job, JobSpec};
use crate::utils::config::AppSettings;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, info_span, warn, Instrument};

/// Entry point for presentation layers
pub struct Orchestrator {
    executor: SingleFlightExecutor,
    policy: TimeoutPolicy,
}

impl Orchestrator {
    pub fn new(executor: SingleFlightExecutor, policy: TimeoutPolicy) -> Self {
        Self { executor, policy }
    }

    /// Wire an orchestrator from settings with its own execution slot.
    ///
    /// The slot always has capacity 1, whatever `max_concurrent` says:
    /// settings built by hand or deserialized never went through
    /// [`AppSettings::normalized`].
    pub fn from_settings(settings: &AppSettings, engine: Arc<dyn ExtractionEngine>) -> Self {
        if settings.max_concurrent != 1 {
            warn!(
                "Ignoring max_concurrent={}; extraction is single-flight",
                settings.max_concurrent
            );
        }
        Self::with_slots(settings, engine, single_slot())
    }

    /// Same as [`Orchestrator::from_settings`] but sharing `slots`
    pub fn with_slots(
        settings: &AppSettings,
        engine: Arc<dyn ExtractionEngine>,
        slots: Arc<Semaphore>,
    ) -> Self {
        let executor = SingleFlightExecutor::new(engine, slots, settings.output_dir.clone());
        Self::new(executor, settings.timeouts.clone())
    }

    pub fn output_dir(&self) -> &Path {
        self.executor.output_dir()
    }

    pub fn policy(&self) -> &TimeoutPolicy {
        &self.policy
    }

    /// Validate a raw request and run it.
    pub async fn submit(&self, raw_url: &str, raw_format: &str) -> Result<DeliveredFile, JobFailure> {
        let spec = build_job(raw_url, raw_format)?;
        self.run(spec).await
    }

    /// Run a validated job to its terminal result.
    pub async fn run(&self, spec: JobSpec) -> Result<DeliveredFile, JobFailure> {
        let span = info_span!("job", id = %spec.id(), kind = %spec.media_kind());
        self.run_inner(spec).instrument(span).await
    }

    async fn run_inner(&self, spec: JobSpec) -> Result<DeliveredFile, JobFailure> {
        info!("Job accepted for {}", spec.source_url());
        let report = FallbackCoordinator::new(&self.executor, &self.policy)
            .run(&spec)
            .await;

        match report.outcome {
            ExecutionOutcome::Success { output_path } => {
                // Leftovers of an earlier attempt share the id
                remove_job_files(self.output_dir(), spec.id(), Some(&output_path)).await;
                info!(
                    "Job finished after {} invocation(s): {}",
                    report.invocations,
                    output_path.display()
                );
                Ok(DeliveredFile::new(&report.spec, output_path))
            }
            ExecutionOutcome::Failure(failure) => {
                let removed = remove_job_files(self.output_dir(), spec.id(), None).await;
                warn!(
                    "Job failed after {} invocation(s) with {} (removed {} partial file(s))",
                    report.invocations, failure.category, removed
                );
                Err(failure)
            }
        }
    }
}
