//! yt-dlp backed extraction engine
//!
//! Runs one `yt-dlp` subprocess per invocation and turns the declarative
//! [`ExtractionOptions`] into command-line flags. The binary can be given
//! explicitly or discovered next to the executable, on `PATH`, or in common
//! install locations.

use crate::extractor::options::ExtractionOptions;
use crate::extractor::traits::{EngineError, ExtractionEngine};
use crate::utils::error::VidloaderError;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How often the child is polled for exit / cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Extraction engine driving the yt-dlp command-line tool
pub struct YtDlpEngine {
    ytdlp_path: PathBuf,
    ffmpeg_location: Option<PathBuf>,
}

impl YtDlpEngine {
    /// Initialize the engine, verifying yt-dlp availability
    ///
    /// Search order when no explicit path is configured:
    /// 1. Next to the running executable
    /// 2. System PATH
    /// 3. Common installation paths (Homebrew, pip --user, etc.)
    pub fn new(
        configured: Option<PathBuf>,
        ffmpeg_location: Option<PathBuf>,
    ) -> Result<Self, VidloaderError> {
        let ytdlp_path = match configured.or_else(find_ytdlp) {
            Some(path) => {
                info!("Using yt-dlp at: {}", path.display());
                path
            }
            None => {
                error!("yt-dlp not found anywhere!");
                return Err(VidloaderError::YtDlpNotFound);
            }
        };

        Ok(Self {
            ytdlp_path,
            ffmpeg_location,
        })
    }

    /// Get the path to yt-dlp being used
    pub fn ytdlp_path(&self) -> &Path {
        &self.ytdlp_path
    }
}

impl ExtractionEngine for YtDlpEngine {
    fn id(&self) -> &'static str {
        "yt-dlp"
    }

    fn execute(
        &self,
        url: &str,
        options: &ExtractionOptions,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        let args = build_args(url, options, self.ffmpeg_location.as_deref());
        debug!("Spawning {} {:?}", self.ytdlp_path.display(), args);

        let mut command = Command::new(&self.ytdlp_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Own process group, so a cancel also reaches the ffmpeg it spawns
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn()?;

        // Drain stderr on its own thread so a chatty child never blocks on a
        // full pipe while we poll it.
        let stderr_reader = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                BufReader::new(stderr)
                    .lines()
                    .map_while(Result::ok)
                    .collect::<Vec<String>>()
            })
        });

        let status = loop {
            if cancel.is_cancelled() {
                warn!("Cancelling yt-dlp for job {}", options.job_id);
                kill_process_tree(&mut child);
                // Reap the zombie
                let _ = child.wait();
                return Err(EngineError::Cancelled);
            }

            match child.try_wait()? {
                Some(status) => break status,
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        let stderr_lines = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if status.success() {
            debug!("yt-dlp finished for job {}", options.job_id);
            return Ok(());
        }

        Err(EngineError::Extraction(failure_message(
            &stderr_lines,
            status.code(),
        )))
    }
}

/// Kill yt-dlp together with any transcoder it started.
///
/// The child leads its own process group (see `execute`), so signalling the
/// group reaches ffmpeg too. Falls back to killing the direct child only.
fn kill_process_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        match Command::new("kill").args(["-KILL", "--", &group]).status() {
            Ok(status) if status.success() => return,
            Ok(status) => warn!("kill {} exited with {}", group, status),
            Err(e) => warn!("Failed to signal process group {}: {}", group, e),
        }
    }

    if let Err(e) = child.kill() {
        warn!("Failed to kill yt-dlp: {}", e);
    }
}

/// Translate an option bundle into yt-dlp arguments
pub fn build_args(
    url: &str,
    options: &ExtractionOptions,
    ffmpeg_location: Option<&Path>,
) -> Vec<String> {
    let mut args = vec![
        "-f".to_string(),
        options.format_selector.clone(),
        "-o".to_string(),
        options.output_template.clone(),
    ];

    if options.single_item {
        args.push("--no-playlist".to_string());
    }
    if options.quiet {
        args.extend(
            ["--quiet", "--no-warnings", "--no-progress"]
                .iter()
                .map(|s| s.to_string()),
        );
    }
    if let Some(location) = ffmpeg_location {
        args.push("--ffmpeg-location".to_string());
        args.push(location.to_string_lossy().into_owned());
    }

    if let Some(pp) = &options.post_processing {
        args.push("--extract-audio".to_string());
        args.push("--audio-format".to_string());
        args.push(pp.codec.as_str().to_string());
        args.push("--audio-quality".to_string());
        args.push(format!("{}K", pp.quality_kbps));

        if let Some(limits) = &options.post_processor_limits {
            args.push("--postprocessor-args".to_string());
            args.push(format!("ExtractAudio:{}", limits.to_transcoder_args().join(" ")));
        }
    }

    // Keep URLs starting with '-' from being read as flags
    args.push("--".to_string());
    args.push(url.to_string());
    args
}

/// Pick the most useful failure text out of yt-dlp's stderr
fn failure_message(stderr_lines: &[String], code: Option<i32>) -> String {
    let errors: Vec<&str> = stderr_lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| l.starts_with("ERROR:"))
        .collect();

    if !errors.is_empty() {
        return errors.join("\n");
    }

    let all = stderr_lines.join("\n");
    let all = all.trim();
    if !all.is_empty() {
        return all.to_string();
    }

    match code {
        Some(code) => format!("yt-dlp exited with status {}", code),
        None => "yt-dlp was terminated by a signal".to_string(),
    }
}

// ============================================================
// Binary Detection Functions
// ============================================================

/// Find yt-dlp binary with priority:
/// 1. Next to the executable
/// 2. System PATH
/// 3. Common installation paths
pub fn find_ytdlp() -> Option<PathBuf> {
    find_tool("yt-dlp")
}

/// Find the transcoder (ffmpeg) the same way
pub fn find_ffmpeg() -> Option<PathBuf> {
    find_tool("ffmpeg")
}

fn find_tool(name: &str) -> Option<PathBuf> {
    if let Some(adjacent) = find_adjacent(name) {
        info!("✓ Using bundled {}: {:?}", name, adjacent);
        return Some(adjacent);
    }

    if let Ok(path) = which::which(name) {
        info!("✓ Using system {}: {:?}", name, path);
        return Some(path);
    }

    if let Some(common) = find_in_common_paths(name) {
        info!("✓ Using {} from common path: {:?}", name, common);
        return Some(common);
    }

    warn!("✗ {} not found anywhere!", name);
    None
}

/// Look for `name` next to the running executable (development / bundles)
fn find_adjacent(name: &str) -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;

    let candidate = exe_dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX));
    if candidate.is_file() && is_executable(&candidate) {
        return Some(candidate);
    }

    None
}

fn find_in_common_paths(name: &str) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = ["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"]
        .iter()
        .map(|dir| Path::new(dir).join(name))
        .collect();

    // pip --user installs
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local").join("bin").join(name));
    }

    candidates
        .into_iter()
        .find(|path| path.is_file() && is_executable(path))
}

/// Check if a file is executable
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.exists()
    }
}

// ============================================================
// Tests
// ============================================================
