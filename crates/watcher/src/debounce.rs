//! Per-path debouncing logic
//!
//! Collapses bursts of create/write notifications for a path into a single
//! process-and-delete action that runs once the file has settled.
//!
//! Every path seen gets its own timer task. A timer starts stopped and is
//! armed by a reset message carrying the new deadline; further resets push
//! the deadline forward. When a deadline passes without another reset the
//! task runs the action, then goes back to waiting for the next reset. The
//! table only maps paths to the reset channel of their task, so the lock is
//! held for a lookup and a non-blocking send, never across an await.
//!
//! Fired timers stay in the table. With `evict_after` set, a timer that stays
//! idle that long after firing removes itself; the removal happens under the
//! table lock after checking for queued resets, so a concurrent event either
//! lands before the check (and the timer stays) or finds no entry (and
//! creates a new one).

use crate::process::Processor;
use crate::{WatchEvent, WatchStreams};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, error, info, trace, warn};

/// Delay after the last qualifying event before a path is processed
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// Configuration for the dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Idle time after firing before a timer drops out of the table
    ///
    /// `None` keeps every timer for the whole session.
    pub evict_after: Option<Duration>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            evict_after: Some(Duration::from_secs(60)),
        }
    }
}

type TimerTable = HashMap<PathBuf, PathTimer>;

/// Table entry: the reset side of a path's timer task
struct PathTimer {
    resets: mpsc::UnboundedSender<Instant>,
    task: JoinHandle<()>,
}

impl PathTimer {
    /// Push the deadline to `deadline`. Returns false if the task has exited.
    fn reset(&self, deadline: Instant) -> bool {
        self.resets.send(deadline).is_ok()
    }
}

/// Debounced event dispatcher
///
/// Feed it events with `on_event` (or let `run` drain a `WatchStreams`);
/// each settled path is handed to the `Processor` once per debounce cycle.
pub struct Dispatcher {
    processor: Arc<Processor>,
    config: DispatcherConfig,
    timers: Arc<Mutex<TimerTable>>,
}

impl Dispatcher {
    /// Create a dispatcher
    pub fn new(processor: Arc<Processor>, config: DispatcherConfig) -> Self {
        Self {
            processor,
            config,
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Handle one file system event
    ///
    /// Callers deliver events in source order from a single context. The
    /// first event for a path spawns its timer task, so this must be called
    /// within a tokio runtime.
    pub fn on_event(&self, event: WatchEvent) {
        debug!(kind = ?event.kind, file = %event.path.display(), "watched event");

        if !event.kind.is_qualifying() {
            return;
        }

        let deadline = Instant::now() + DEBOUNCE_WINDOW;
        let mut timers = self.timers.lock();

        if let Some(timer) = timers.get(&event.path) {
            if timer.reset(deadline) {
                trace!(file = %event.path.display(), "debounce timer reset");
                return;
            }
            warn!(file = %event.path.display(), "debounce timer exited unexpectedly, replacing");
        }

        let timer = self.spawn_timer(event.path.clone());
        // A fresh task holds its receiver, so the first reset cannot fail.
        timer.reset(deadline);
        timers.insert(event.path, timer);
    }

    /// Drain both watch streams until they are closed
    ///
    /// Watch errors are logged and do not stop the loop.
    pub async fn run(&self, streams: WatchStreams) {
        let WatchStreams {
            mut events,
            mut errors,
        } = streams;
        let mut events_open = true;
        let mut errors_open = true;

        while events_open || errors_open {
            tokio::select! {
                event = events.recv(), if events_open => match event {
                    Some(event) => self.on_event(event),
                    None => events_open = false,
                },
                err = errors.recv(), if errors_open => match err {
                    Some(err) => error!(error = %err, "watcher encountered an error"),
                    None => errors_open = false,
                },
            }
        }

        debug!("watch streams closed");
    }

    /// Number of paths currently holding a timer
    pub fn pending_paths(&self) -> usize {
        self.timers.lock().len()
    }

    /// Stop accepting events and wait for every armed timer to fire
    ///
    /// Armed timers still wait out their deadline, so a file written just
    /// before shutdown is processed rather than dropped.
    pub async fn shutdown(self) {
        let drained: Vec<PathTimer> = {
            let mut timers = self.timers.lock();
            timers.drain().map(|(_, timer)| timer).collect()
        };

        info!(timers = drained.len(), "draining debounce timers");

        // Closing every reset channel tells idle tasks to exit and armed ones
        // to fire one last time.
        let tasks: Vec<JoinHandle<()>> = drained.into_iter().map(|timer| timer.task).collect();

        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "debounce timer task failed");
            }
        }
    }

    fn spawn_timer(&self, path: PathBuf) -> PathTimer {
        let (resets, rx) = mpsc::unbounded_channel();
        let task = TimerTask {
            path,
            resets: rx,
            processor: self.processor.clone(),
            table: Arc::downgrade(&self.timers),
            evict_after: self.config.evict_after,
        };

        PathTimer {
            resets,
            task: tokio::spawn(task.run()),
        }
    }
}

/// Outcome of an eviction attempt
enum Eviction {
    Evicted,
    Rearm(Instant),
}

struct TimerTask {
    path: PathBuf,
    resets: mpsc::UnboundedReceiver<Instant>,
    processor: Arc<Processor>,
    table: Weak<Mutex<TimerTable>>,
    evict_after: Option<Duration>,
}

impl TimerTask {
    async fn run(mut self) {
        // None while stopped.
        let mut deadline: Option<Instant> = None;
        let mut fired = false;

        loop {
            match deadline {
                Some(at) => {
                    tokio::select! {
                        // A reset queued at the deadline still wins.
                        biased;

                        reset = self.resets.recv() => match reset {
                            Some(next) => deadline = Some(next),
                            None => {
                                sleep_until(at).await;
                                self.fire().await;
                                return;
                            }
                        },
                        _ = sleep_until(at) => {
                            deadline = None;
                            self.fire().await;
                            fired = true;
                        }
                    }
                }
                None => {
                    let reset = match self.evict_after {
                        Some(idle) if fired => match timeout(idle, self.resets.recv()).await {
                            Ok(reset) => reset,
                            Err(_) => match self.try_evict() {
                                Eviction::Evicted => return,
                                Eviction::Rearm(next) => Some(next),
                            },
                        },
                        _ => self.resets.recv().await,
                    };

                    match reset {
                        Some(next) => deadline = Some(next),
                        None => return,
                    }
                }
            }
        }
    }

    async fn fire(&self) {
        trace!(file = %self.path.display(), "debounce timer fired");
        if let Err(e) = self.processor.process(&self.path).await {
            error!(file = %self.path.display(), error = %e, "failed to process file");
        }
    }

    fn try_evict(&mut self) -> Eviction {
        let Some(table) = self.table.upgrade() else {
            return Eviction::Evicted;
        };
        let mut table = table.lock();

        // Resets are sent under this lock, so anything not seen here was
        // sent before the entry could be found, or will find it gone.
        match self.resets.try_recv() {
            Ok(next) => Eviction::Rearm(next),
            Err(TryRecvError::Empty) => {
                table.remove(&self.path);
                debug!(file = %self.path.display(), "evicted idle debounce timer");
                Eviction::Evicted
            }
            Err(TryRecvError::Disconnected) => Eviction::Evicted,
        }
    }
}
