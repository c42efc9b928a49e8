//! Directory watch source using the notify crate
//!
//! Registers a non-recursive watch on exactly one directory and forwards
//! notifications as two streams: translated `WatchEvent`s and watch errors.
//! Dropping the `WatchSource` unregisters the watch and closes both streams.

use crate::{EventKind, WatchEvent};
use notify::event::ModifyKind;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, trace};

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to create watcher: {0}")]
    Init(#[source] notify::Error),

    #[error("failed to add watch dir {}: {source}", dir.display())]
    Register {
        dir: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Receiving side of a watch
pub struct WatchStreams {
    pub events: mpsc::UnboundedReceiver<WatchEvent>,
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
}

impl WatchStreams {
    /// Streams not backed by an OS watch, fed by the returned senders
    pub fn channel() -> (
        mpsc::UnboundedSender<WatchEvent>,
        mpsc::UnboundedSender<notify::Error>,
        Self,
    ) {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (error_tx, errors) = mpsc::unbounded_channel();
        (event_tx, error_tx, Self { events, errors })
    }
}

/// Active OS-level watch on a single directory
pub struct WatchSource {
    dir: PathBuf,
    // Held for its Drop impl, which stops the watch.
    _watcher: RecommendedWatcher,
}

impl WatchSource {
    /// Start watching `dir` (non-recursive)
    pub fn new(dir: &Path) -> Result<(Self, WatchStreams), WatchError> {
        let (event_tx, error_tx, streams) = WatchStreams::channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                trace!(?event, "raw notify event");
                let kind = translate_kind(&event.kind);
                for path in event.paths {
                    // Receiver gone means the dispatcher loop has exited.
                    let _ = event_tx.send(WatchEvent { kind, path });
                }
            }
            Err(e) => {
                if error_tx.send(e).is_err() {
                    error!("watch error after stream closed");
                }
            }
        })
        .map_err(WatchError::Init)?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Register {
                dir: dir.to_path_buf(),
                source,
            })?;

        info!(watchdir = %dir.display(), "watching directory");

        Ok((
            Self {
                dir: dir.to_path_buf(),
                _watcher: watcher,
            },
            streams,
        ))
    }

    /// Directory being watched
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Map a notify event kind onto the kinds the dispatcher cares about
pub fn translate_kind(kind: &notify::EventKind) -> EventKind {
    match kind {
        notify::EventKind::Create(_) => EventKind::Created,
        notify::EventKind::Modify(ModifyKind::Data(_)) | notify::EventKind::Modify(ModifyKind::Any) => {
            EventKind::Written
        }
        _ => EventKind::Other,
    }
}
