//! Staging-directory housekeeping
//!
//! Everything the engine writes for a job is named after the job id, so
//! discovery and cleanup are both "entries whose name starts with the id".

use crate::job::JobId;
use crate::utils::error::VidloaderError;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffixes yt-dlp uses for in-progress downloads
const TEMP_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp"];

/// Deletes a file when dropped, unless already removed.
///
/// Deletion is best-effort: failures are logged, never returned, and a
/// file that is already gone counts as removed.
#[derive(Debug)]
pub struct CleanupGuard {
    path: PathBuf,
    done: bool,
}

impl CleanupGuard {
    pub fn new(path: PathBuf) -> Self {
        Self { path, done: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file now. Idempotent.
    pub fn remove_now(&mut self) {
        if !self.done {
            self.done = true;
            remove_file_logged(&self.path);
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.remove_now();
    }
}

/// Remove one file, logging instead of failing. Returns whether a file was
/// actually deleted by this call.
pub fn remove_file_logged(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Already gone: {}", path.display());
            false
        }
        Err(e) => {
            warn!("Failed to remove {}: {}", path.display(), e);
            false
        }
    }
}

fn is_temp_name(name: &str) -> bool {
    TEMP_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// All regular files in `dir` whose name starts with the job id, sorted by name
async fn job_files(dir: &Path, job_id: &JobId) -> io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.starts_with(job_id.as_str()) && entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}

/// Locate the finished output for `job_id`, ignoring engine temporaries
pub async fn find_job_output(dir: &Path, job_id: &JobId) -> io::Result<Option<PathBuf>> {
    let files = job_files(dir, job_id).await?;
    Ok(files.into_iter().find(|path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| !is_temp_name(n))
    }))
}

/// Best-effort removal of every file staged for `job_id`, except `keep`.
/// Returns how many files were removed.
pub async fn remove_job_files(dir: &Path, job_id: &JobId, keep: Option<&Path>) -> usize {
    let files = match job_files(dir, job_id).await {
        Ok(files) => files,
        Err(e) => {
            warn!("Failed to list {} for cleanup of job {}: {}", dir.display(), job_id, e);
            return 0;
        }
    };

    let mut removed = 0;
    for path in files {
        if keep.is_some_and(|k| k == path) {
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed leftover {}", path.display());
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove leftover {}: {}", path.display(), e),
        }
    }
    removed
}

/// Remove every regular file in the staging directory.
pub async fn purge_output_dir(dir: &Path) -> Result<usize, VidloaderError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            tokio::fs::remove_file(entry.path()).await?;
            removed += 1;
        }
    }

    info!("Purged {} file(s) from {}", removed, dir.display());
    Ok(removed)
}
