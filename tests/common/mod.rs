//! Shared test fixtures: a scripted, instrumented extraction engine.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use vidloader::extractor::{EngineError, ExtractionEngine, ExtractionOptions};
use vidloader::{AppSettings, Orchestrator, TimeoutPolicy};

/// What the fake engine does on one invocation
#[derive(Debug, Clone)]
pub enum Step {
    /// Write `{id}.{ext}` and succeed. `ext` is the native container; when the
    /// options ask for transcoding the codec's extension is used instead.
    Succeed { native_ext: &'static str },
    /// Succeed without writing anything
    SucceedWithoutOutput,
    /// Raise a typed extraction failure
    Fail(&'static str),
    /// Leave a `.part` file behind, then fail
    FailAfterPartial(&'static str),
    /// Work for `Duration`, honouring cancellation, then succeed
    Work(Duration),
    /// Block for `Duration` ignoring cancellation, then write output and succeed
    Hang(Duration),
}

/// One recorded engine call
#[derive(Debug, Clone)]
pub struct Invocation {
    pub url: String,
    pub options: ExtractionOptions,
    pub started: Instant,
    pub finished: Instant,
}

pub struct ScriptedEngine {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Invocation>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Highest number of simultaneously running invocations observed
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Succeed { native_ext: "mp4" })
    }
}

fn write_output(options: &ExtractionOptions, native_ext: &str) {
    let ext = options
        .post_processing
        .as_ref()
        .map(|pp| pp.codec.extension())
        .unwrap_or(native_ext);
    std::fs::write(options.output_path_for(ext), b"media bytes").unwrap();
}

impl ExtractionEngine for ScriptedEngine {
    fn id(&self) -> &'static str {
        "scripted"
    }

    fn execute(
        &self,
        url: &str,
        options: &ExtractionOptions,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        let started = Instant::now();

        let result = match self.next_step() {
            Step::Succeed { native_ext } => {
                write_output(options, native_ext);
                Ok(())
            }
            Step::SucceedWithoutOutput => Ok(()),
            Step::Fail(message) => Err(EngineError::Extraction(message.to_string())),
            Step::FailAfterPartial(message) => {
                std::fs::write(options.output_path_for("webm.part"), b"half").unwrap();
                Err(EngineError::Extraction(message.to_string()))
            }
            Step::Work(duration) => {
                let deadline = Instant::now() + duration;
                loop {
                    if cancel.is_cancelled() {
                        break Err(EngineError::Cancelled);
                    }
                    if Instant::now() >= deadline {
                        write_output(options, "mp4");
                        break Ok(());
                    }
                    std::thread::sleep(Duration::from_millis(2));
                }
            }
            Step::Hang(duration) => {
                std::thread::sleep(duration);
                write_output(options, "mp4");
                Ok(())
            }
        };

        let finished = Instant::now();
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Invocation {
            url: url.to_string(),
            options: options.clone(),
            started,
            finished,
        });
        result
    }
}

/// Deadlines short enough for tests but far above scheduling noise
pub fn quick_policy() -> TimeoutPolicy {
    TimeoutPolicy {
        video: Duration::from_secs(5),
        audio: Duration::from_secs(5),
        audio_slow_platform: Duration::from_secs(5),
        audio_fallback: Duration::from_secs(5),
    }
}

pub fn settings(dir: &Path, timeouts: TimeoutPolicy) -> AppSettings {
    AppSettings {
        output_dir: dir.to_path_buf(),
        timeouts,
        ..Default::default()
    }
}

pub fn orchestrator(dir: &Path, engine: Arc<ScriptedEngine>, timeouts: TimeoutPolicy) -> Orchestrator {
    Orchestrator::from_settings(&settings(dir, timeouts), engine)
}

/// Names of all files currently in `dir`
pub fn staged_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}
