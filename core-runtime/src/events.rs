//! # Progress Event Bus
//!
//! Broadcasts mirror progress with `tokio::sync::broadcast` so that a
//! progress display (or any other observer) can follow a run without the
//! walker knowing who is listening.
//!
//! ## Overview
//!
//! - **MirrorEvent**: what happened during a run, serde-tagged for JSON output
//! - **EventBus**: cloneable broadcast handle; `emit` never blocks
//! - **EventStream**: receiver wrapper with an optional filter
//!
//! Publishing is fire-and-forget. A bus without subscribers reports an error
//! from `emit`, which publishers ignore; a slow subscriber sees
//! `RecvError::Lagged` instead of slowing the walk down.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::events::{EventBus, EventStream, MirrorEvent};
//!
//! let bus = EventBus::new(256);
//! let mut folders = EventStream::new(bus.subscribe())
//!     .filter(|event| matches!(event, MirrorEvent::FolderEntered { .. }));
//!
//! core_async::spawn(async move {
//!     while let Ok(MirrorEvent::FolderEntered { local_path, .. }) = folders.recv().await {
//!         println!("{local_path}");
//!     }
//! });
//! ```

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use broadcast::error::{RecvError, SendError};
pub use broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// A walk over a large library emits one event per pointer file; subscribers
/// that fall further behind than this receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 1024;

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Progress of a single mirror run.
///
/// Every variant carries the `run_id` of the walk that produced it so that
/// events of overlapping runs on a shared bus can be told apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum MirrorEvent {
    /// The root was resolved and the walk begins.
    Started {
        run_id: String,
        root_id: String,
        /// Name of the top-level mirrored directory
        root_name: String,
        destination: String,
        /// Unix epoch seconds
        started_at: i64,
    },
    /// A folder was accepted and its local directory exists.
    FolderEntered {
        run_id: String,
        folder_id: String,
        name: String,
        /// 0 for the root
        depth: usize,
        local_path: String,
    },
    /// All children of a folder were processed.
    FolderExited {
        run_id: String,
        folder_id: String,
        depth: usize,
        /// Pointer files written directly inside this folder
        pointers_written: u64,
    },
    /// A pointer file was written.
    PointerWritten {
        run_id: String,
        file_id: String,
        path: String,
    },
    /// A folder reachable through more than one parent was seen again.
    FolderSkipped {
        run_id: String,
        folder_id: String,
        name: String,
    },
    /// A remote call failed transiently and will be retried.
    Retrying {
        run_id: String,
        operation: String,
        /// Attempt that just failed (1-based)
        attempt: u32,
        max_attempts: u32,
        delay_ms: u64,
        message: String,
    },
    /// The walk finished.
    Completed {
        run_id: String,
        folders: u64,
        pointers: u64,
        skipped_folders: u64,
        skipped_files: u64,
        pages: u64,
        duration_ms: u64,
    },
    /// The walk aborted.
    Failed { run_id: String, message: String },
}

impl MirrorEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            MirrorEvent::Started { .. } => "Mirror started",
            MirrorEvent::FolderEntered { .. } => "Entered folder",
            MirrorEvent::FolderExited { .. } => "Finished folder",
            MirrorEvent::PointerWritten { .. } => "Wrote pointer file",
            MirrorEvent::FolderSkipped { .. } => "Skipped already mirrored folder",
            MirrorEvent::Retrying { .. } => "Retrying remote call",
            MirrorEvent::Completed { .. } => "Mirror completed",
            MirrorEvent::Failed { .. } => "Mirror failed",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            MirrorEvent::Failed { .. } => EventSeverity::Error,
            MirrorEvent::FolderSkipped { .. } | MirrorEvent::Retrying { .. } => {
                EventSeverity::Warning
            }
            MirrorEvent::Started { .. }
            | MirrorEvent::FolderEntered { .. }
            | MirrorEvent::Completed { .. } => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Identifier of the run that produced the event.
    pub fn run_id(&self) -> &str {
        match self {
            MirrorEvent::Started { run_id, .. }
            | MirrorEvent::FolderEntered { run_id, .. }
            | MirrorEvent::FolderExited { run_id, .. }
            | MirrorEvent::PointerWritten { run_id, .. }
            | MirrorEvent::FolderSkipped { run_id, .. }
            | MirrorEvent::Retrying { run_id, .. }
            | MirrorEvent::Completed { run_id, .. }
            | MirrorEvent::Failed { run_id, .. } => run_id,
        }
    }

    /// True for the last event of a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MirrorEvent::Completed { .. } | MirrorEvent::Failed { .. }
        )
    }
}

/// Central broadcast channel for mirror events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MirrorEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: MirrorEvent) -> Result<usize, SendError<MirrorEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<MirrorEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

type EventFilter = Box<dyn Fn(&MirrorEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` that can skip unwanted events.
pub struct EventStream {
    receiver: Receiver<MirrorEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<MirrorEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv`/`try_recv`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&MirrorEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn matches(&self, event: &MirrorEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` if the subscriber fell behind by `n` events,
    /// `RecvError::Closed` once every bus handle has been dropped.
    pub async fn recv(&mut self) -> Result<MirrorEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching event is currently queued.
    pub fn try_recv(&mut self) -> Option<Result<MirrorEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
