//! Single-flight extraction executor
//!
//! At most one engine invocation runs at any instant across the whole
//! process. The slot is a semaphore permit that moves into the blocking
//! engine call, so it is released exactly when that call returns, on every
//! path (success, failure, panic, deadline).

use crate::delivery::{find_job_output, remove_job_files};
use crate::extractor::{EngineError, ExtractionEngine, ExtractionOptions};
use crate::orchestrator::classify::classify_message;
use crate::orchestrator::outcome::{ErrorCategory, ExecutionOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Create the process-wide execution slot (capacity 1)
pub fn single_slot() -> Arc<Semaphore> {
    Arc::new(Semaphore::new(1))
}

/// Runs extraction jobs one at a time under a hard deadline
pub struct SingleFlightExecutor {
    engine: Arc<dyn ExtractionEngine>,
    slots: Arc<Semaphore>,
    output_dir: PathBuf,
}

impl SingleFlightExecutor {
    /// `slots` is injected so callers (and tests) control who shares it.
    pub fn new(engine: Arc<dyn ExtractionEngine>, slots: Arc<Semaphore>, output_dir: PathBuf) -> Self {
        Self {
            engine,
            slots,
            output_dir,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run one extraction. Waits for the execution slot first; the deadline
    /// starts once the slot is held.
    pub async fn execute(
        &self,
        url: &str,
        options: ExtractionOptions,
        timeout: Duration,
    ) -> ExecutionOutcome {
        let permit = match Arc::clone(&self.slots).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                error!("Execution slot closed; refusing job {}", options.job_id);
                return ExecutionOutcome::failure(ErrorCategory::Unknown, "execution slot closed");
            }
        };

        let job_id = options.job_id.clone();
        debug!("Acquired execution slot for job {}", job_id);

        let engine = Arc::clone(&self.engine);
        let cancel = CancellationToken::new();
        let engine_cancel = cancel.clone();
        let engine_url = url.to_string();

        let mut handle = tokio::task::spawn_blocking(move || {
            // Released when the engine call returns, whatever happened upstream
            let _permit = permit;
            engine.execute(&engine_url, &options, &engine_cancel)
        });

        let result = match tokio::time::timeout(timeout, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!("Job {} exceeded its {:?} deadline; cancelling", job_id, timeout);
                cancel.cancel();
                self.sweep_when_abandoned(handle, job_id);
                return ExecutionOutcome::failure(
                    ErrorCategory::Timeout,
                    format!("extraction did not finish within {:?}", timeout),
                );
            }
        };

        match result {
            Ok(Ok(())) => self.locate_output(&job_id).await,
            Ok(Err(EngineError::Extraction(message))) => {
                let category = classify_message(&message);
                if category == ErrorCategory::Unknown {
                    error!("Job {} failed with unclassified error: {}", job_id, message);
                } else {
                    info!("Job {} failed ({}): {}", job_id, category, message);
                }
                ExecutionOutcome::failure(category, message)
            }
            Ok(Err(e)) => {
                error!("Job {} engine error: {}", job_id, e);
                ExecutionOutcome::failure(ErrorCategory::Unknown, e.to_string())
            }
            Err(join_err) => {
                error!("Job {} engine task failed: {}", job_id, join_err);
                ExecutionOutcome::failure(
                    ErrorCategory::Unknown,
                    format!("engine task failed: {}", join_err),
                )
            }
        }
    }

    async fn locate_output(&self, job_id: &crate::job::JobId) -> ExecutionOutcome {
        match find_job_output(&self.output_dir, job_id).await {
            Ok(Some(output_path)) => {
                info!("Job {} produced {}", job_id, output_path.display());
                ExecutionOutcome::Success { output_path }
            }
            Ok(None) => {
                error!(
                    "Engine reported success for job {} but nothing was staged in {}",
                    job_id,
                    self.output_dir.display()
                );
                ExecutionOutcome::failure(ErrorCategory::Unknown, "File not found after download")
            }
            Err(e) => {
                error!("Failed to scan {}: {}", self.output_dir.display(), e);
                ExecutionOutcome::failure(
                    ErrorCategory::Unknown,
                    format!("failed to scan output directory: {}", e),
                )
            }
        }
    }

    /// The engine may keep writing after the deadline if it ignores
    /// cancellation; once it finally returns, drop whatever it staged.
    fn sweep_when_abandoned(
        &self,
        handle: tokio::task::JoinHandle<Result<(), EngineError>>,
        job_id: crate::job::JobId,
    ) {
        let output_dir = self.output_dir.clone();
        tokio::spawn(async move {
            let _ = handle.await;
            let removed = remove_job_files(&output_dir, &job_id, None).await;
            debug!(
                "Abandoned job {} returned; swept {} staged file(s)",
                job_id, removed
            );
        });
    }
}
