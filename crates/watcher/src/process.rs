//! Process-and-delete action
//!
//! Uploads a settled file and removes the local copy once the server has
//! accepted it. Shared by the debounce dispatcher and the startup reconciler.

use client::{UploadError, Uploader};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Failure of a single process-and-delete attempt
///
/// Both variants are terminal for the attempt; nothing is retried.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to upload document: {0}")]
    Upload(#[from] UploadError),

    /// The upload went through but the local file is still there
    #[error("failed to delete file after successful upload (document {id}): {source}")]
    Delete {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Uploads files through an `Uploader` and deletes them on success
pub struct Processor {
    uploader: Arc<dyn Uploader>,
    tag: Option<u32>,
}

impl Processor {
    pub fn new(uploader: Arc<dyn Uploader>, tag: Option<u32>) -> Self {
        Self { uploader, tag }
    }

    /// Upload `path`, then delete it. Returns the remote document id.
    pub async fn process(&self, path: &Path) -> Result<String, ProcessError> {
        let id = self.uploader.upload(path, self.tag).await?;
        info!(file = %path.display(), id = %id, "document processed");

        if let Err(source) = tokio::fs::remove_file(path).await {
            return Err(ProcessError::Delete { id, source });
        }
        debug!(file = %path.display(), "cleanup complete");

        Ok(id)
    }
}
