//! Test doubles shared by the watcher unit tests

use async_trait::async_trait;
use client::{UploadError, Uploader};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct UploadCall {
    pub path: PathBuf,
    pub tag: Option<u32>,
    pub at: Instant,
}

/// Uploader that records every call instead of talking to a server
///
/// Succeeds with `doc-<file name>` unless the file name is listed as failing,
/// in which case it answers like a server returning 500. Files listed as slow
/// take that long to answer; the call is recorded when it starts.
#[derive(Default)]
pub struct RecordingUploader {
    calls: Mutex<Vec<UploadCall>>,
    failing: HashSet<String>,
    slow: HashMap<String, Duration>,
}

impl RecordingUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            failing: names.into_iter().map(String::from).collect(),
            ..Self::default()
        }
    }

    pub fn slow(name: &str, delay: Duration) -> Self {
        Self {
            slow: HashMap::from([(name.to_string(), delay)]),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, path: &Path) -> Vec<UploadCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Uploader for RecordingUploader {
    async fn upload(&self, path: &Path, tag: Option<u32>) -> Result<String, UploadError> {
        self.calls.lock().push(UploadCall {
            path: path.to_path_buf(),
            tag,
            at: Instant::now(),
        });

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(delay) = self.slow.get(&name) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(&name) {
            return Err(UploadError::Status {
                status: 500,
                body: "server error".to_string(),
            });
        }

        Ok(format!("doc-{name}"))
    }
}
