//! File system watching for paperproxy
//!
//! This crate turns directory change notifications into document uploads:
//! - Non-recursive watch source over a single directory
//! - Per-path debouncing (fixed 100ms window)
//! - Process-and-delete action shared by the dispatcher and reconciler
//! - One-shot startup reconciliation of files already present

pub mod debounce;
pub mod process;
pub mod reconcile;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use debounce::{Dispatcher, DispatcherConfig, DEBOUNCE_WINDOW};
pub use process::{ProcessError, Processor};
pub use reconcile::{ReconcileError, Reconciler};
pub use source::{WatchError, WatchSource, WatchStreams};

use std::path::PathBuf;

/// File system event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Type of change
    pub kind: EventKind,
    /// Path that changed
    pub path: PathBuf,
}

impl WatchEvent {
    pub fn new(kind: EventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// File created
    Created,
    /// File contents written
    Written,
    /// Anything else (removal, rename, metadata, access)
    Other,
}

impl EventKind {
    /// Whether this kind of event should (re)arm a path's debounce timer
    pub fn is_qualifying(self) -> bool {
        matches!(self, EventKind::Created | EventKind::Written)
    }
}
