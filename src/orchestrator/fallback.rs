//! Primary attempt plus the one-shot raw-audio fallback

use crate::extractor::compile_options;
use crate::job::{Attempt, JobSpec, MediaKind};
use crate::orchestrator::executor::SingleFlightExecutor;
use crate::orchestrator::outcome::{ErrorCategory, ExecutionOutcome, JobFailure};
use crate::orchestrator::policy::TimeoutPolicy;
use tracing::{info, warn};

/// Final state of a job after at most two executor invocations
#[derive(Debug, Clone)]
pub struct AttemptReport {
    /// Spec of the last attempt made
    pub spec: JobSpec,
    pub outcome: ExecutionOutcome,
    /// Number of executor invocations (1 or 2)
    pub invocations: u8,
}

/// Whether `outcome` of `spec` entitles the job to the raw-audio fallback.
pub fn needs_fallback(spec: &JobSpec, outcome: &ExecutionOutcome) -> bool {
    spec.media_kind() == MediaKind::Audio
        && spec.attempt() == Attempt::Primary
        && outcome.category() == Some(ErrorCategory::MissingTranscoder)
}

pub struct FallbackCoordinator<'a> {
    executor: &'a SingleFlightExecutor,
    policy: &'a TimeoutPolicy,
}

impl<'a> FallbackCoordinator<'a> {
    pub fn new(executor: &'a SingleFlightExecutor, policy: &'a TimeoutPolicy) -> Self {
        Self { executor, policy }
    }

    /// Run `spec`, falling back once if the transcoder is missing.
    pub async fn run(&self, spec: &JobSpec) -> AttemptReport {
        let outcome = self.attempt(spec).await;

        if !needs_fallback(spec, &outcome) {
            return AttemptReport {
                spec: spec.clone(),
                outcome,
                invocations: 1,
            };
        }

        warn!("Transcoder unavailable for job {}; retrying without transcoding", spec.id());
        let fallback = spec.to_fallback();
        let outcome = match self.attempt(&fallback).await {
            ExecutionOutcome::Failure(cause) => {
                warn!("Fallback for job {} failed too: {}", spec.id(), cause);
                ExecutionOutcome::Failure(JobFailure::new(
                    ErrorCategory::FallbackFailed,
                    format!("raw audio fallback failed ({}): {}", cause.category, cause.message),
                ))
            }
            success => {
                info!("Fallback for job {} succeeded", spec.id());
                success
            }
        };

        AttemptReport {
            spec: fallback,
            outcome,
            invocations: 2,
        }
    }

    async fn attempt(&self, spec: &JobSpec) -> ExecutionOutcome {
        let options = compile_options(spec, self.executor.output_dir());
        let timeout = self.policy.timeout_for(spec);
        info!(
            "Starting {:?} attempt for job {} (deadline {:?})",
            spec.attempt(),
            spec.id(),
            timeout
        );
        self.executor.execute(spec.source_url(), options, timeout).await
    }
}
