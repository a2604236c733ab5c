//! Per-request job directories and the streaming body that owns them

use anyhow::Result;
use futures::Stream;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Scratch directory holding one download, removed on drop
#[derive(Debug)]
pub struct JobDir {
    path: PathBuf,
}

impl JobDir {
    pub async fn create(transfer_dir: &Path) -> Result<Self> {
        let path = transfer_dir.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&path).await?;
        debug!("Created job directory {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for JobDir {
    fn drop(&mut self) {
        let path = std::mem::take(&mut self.path);
        // Removing a large download can block for a while, keep it off the workers
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_job_dir(&path));
            }
            Err(_) => remove_job_dir(&path),
        }
    }
}

fn remove_job_dir(path: &Path) {
    match std::fs::remove_dir_all(path) {
        Ok(()) => info!("Cleaned up temporary files in {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Cleanup error for {}: {}", path.display(), e),
    }
}

/// Only names produced by [`JobDir::create`] count as jobs
fn is_job_name(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| Uuid::parse_str(n).is_ok())
}

/// File stream that keeps its job directory alive until the body is dropped
pub struct JobFileStream {
    inner: ReaderStream<File>,
    _job: JobDir,
}

impl JobFileStream {
    pub fn new(file: File, job: JobDir) -> Self {
        Self {
            inner: ReaderStream::new(file),
            _job: job,
        }
    }
}

impl Stream for JobFileStream {
    type Item = <ReaderStream<File> as Stream>::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Remove job directories left behind by a previous run
///
/// Anything in `transfer_dir` not named like a job is left alone.
pub async fn cleanup_stale_jobs(transfer_dir: &Path) -> Result<usize> {
    let mut entries = match tokio::fs::read_dir(transfer_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        if !is_job_name(&entry.file_name()) {
            debug!("Skipping non-job entry {:?}", entry.path());
            continue;
        }
        if entry.file_type().await?.is_dir() {
            match tokio::fs::remove_dir_all(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Could not remove stale job {:?}: {}", entry.path(), e),
            }
        }
    }
    if removed > 0 {
        info!("Removed {} stale job directories", removed);
    }
    Ok(removed)
}
