//! Startup reconciliation
//!
//! Processes files that were already sitting in the watch directory before
//! the watcher came up (dropped while the service was down, or left behind
//! by a failed upload in a previous run).

use crate::process::Processor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
#[error("failed to list directory {}: {source}", dir.display())]
pub struct ReconcileError {
    pub dir: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// One-shot reconciler for the watch directory
pub struct Reconciler {
    processor: Arc<Processor>,
}

impl Reconciler {
    pub fn new(processor: Arc<Processor>) -> Self {
        Self { processor }
    }

    /// Process every file currently in `dir` (non-recursive)
    ///
    /// Only listing the directory can fail. Per-file failures are logged and
    /// the remaining files are still processed. Returns the number of files
    /// found.
    pub async fn reconcile(&self, dir: &Path) -> Result<usize, ReconcileError> {
        info!(watchdir = %dir.display(), "running startup reconcile");

        let files = list_files(dir).await.map_err(|source| ReconcileError {
            dir: dir.to_path_buf(),
            source,
        })?;

        if files.is_empty() {
            debug!(watchdir = %dir.display(), "nothing to reconcile");
            return Ok(0);
        }

        warn!(count = files.len(), watchdir = %dir.display(), "cleaning up orphaned files");

        for file in &files {
            if let Err(e) = self.processor.process(file).await {
                error!(file = %file.display(), error = %e, "failed while processing file");
            }
        }

        Ok(files.len())
    }
}

/// Regular files directly inside `dir`, sorted by name
async fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() {
            files.push(path);
        } else {
            debug!(path = %path.display(), "skipping non-file entry");
        }
    }

    files.sort();
    Ok(files)
}
