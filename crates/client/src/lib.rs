//! Document upload client for Paperless
//!
//! This crate provides:
//! - The `Uploader` seam used by the watcher to hand off settled files
//! - `PaperlessClient`, a multipart REST implementation of it
//! - `UploadError`, distinguishing local, transport and server failures

pub mod paperless;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use paperless::PaperlessClient;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Uploads a local file and returns the remote document identifier
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload `path`, optionally classifying it with `tag`
    async fn upload(&self, path: &Path, tag: Option<u32>) -> Result<String, UploadError>;
}

/// Errors returned by an upload attempt
#[derive(Debug, Error)]
pub enum UploadError {
    /// The local file could not be opened or read
    #[error("failed to open file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The request never produced a response
    #[error("failed to send request: {0}")]
    Transport(#[source] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("upload failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The success response body could not be read
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}
