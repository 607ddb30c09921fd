//! Result delivery
//!
//! A [`DeliveredFile`] owns the staged output of one successful job. The
//! file is deleted exactly once, whichever way the caller lets go of it:
//! after the [`DeliveryStream`] is read to the end, when the stream or the
//! handle is dropped unread, or after [`DeliveredFile::save_to`] copies it
//! out.

pub mod cleanup;

pub use cleanup::{find_job_output, purge_output_dir, remove_job_files, CleanupGuard};

use crate::job::{JobId, JobSpec, MediaKind};
use futures::{Stream, StreamExt};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

/// Successful job output, deleted when released
#[derive(Debug)]
pub struct DeliveredFile {
    job_id: JobId,
    media_kind: MediaKind,
    suggested_filename: String,
    guard: CleanupGuard,
}

impl DeliveredFile {
    pub(crate) fn new(spec: &JobSpec, path: PathBuf) -> Self {
        let suggested_filename = suggested_filename(spec.media_kind(), spec.id(), &path);
        Self {
            job_id: spec.id().clone(),
            media_kind: spec.media_kind(),
            suggested_filename,
            guard: CleanupGuard::new(path),
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    /// Staged location on disk
    pub fn path(&self) -> &Path {
        self.guard.path()
    }

    /// `{video|audio}_{job id}.{ext}`
    pub fn suggested_filename(&self) -> &str {
        &self.suggested_filename
    }

    /// Extension of the file the engine actually produced
    pub fn extension(&self) -> Option<&str> {
        self.path().extension().and_then(|e| e.to_str())
    }

    /// Open the file as a byte stream. The staged file is removed once the
    /// stream ends or is dropped.
    pub async fn into_stream(self) -> io::Result<DeliveryStream> {
        // On error `self` drops here and the guard still cleans up
        let file = File::open(self.path()).await?;
        Ok(DeliveryStream {
            inner: ReaderStream::new(file),
            guard: self.guard,
        })
    }

    /// Stream the file into `dest_dir` under its suggested name.
    pub async fn save_to(self, dest_dir: &Path) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(dest_dir).await?;
        let dest = dest_dir.join(&self.suggested_filename);

        // Open the source first so a missing file leaves nothing behind in dest_dir
        let mut stream = self.into_stream().await?;
        let mut out = File::create(&dest).await?;
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        out.flush().await?;

        info!("Saved {} ({} bytes)", dest.display(), written);
        Ok(dest)
    }
}

/// Byte stream over a delivered file that owns its deletion
pub struct DeliveryStream {
    inner: ReaderStream<File>,
    guard: CleanupGuard,
}

impl Stream for DeliveryStream {
    type Item = <ReaderStream<File> as Stream>::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = Pin::new(&mut self.inner).poll_next(cx);
        if let Poll::Ready(None) = polled {
            // Fully consumed; the reader has already closed the file
            debug!("Delivery of {} complete", self.guard.path().display());
            self.guard.remove_now();
        }
        polled
    }
}

fn suggested_filename(kind: MediaKind, id: &JobId, path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", kind, id, ext),
        None => format!("{}_{}", kind, id),
    }
}
