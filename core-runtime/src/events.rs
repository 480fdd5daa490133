//! # Reader Events
//!
//! Broadcast of reader lifecycle and health events to whoever in the host
//! wants them (UI, telemetry, a log sink).
//!
//! Readers publish [`ReaderEvent`]s wrapped in [`CoreEvent`] on an
//! [`EventBus`]. The bus also implements [`IntegrityNotifier`], so it can be
//! handed to a reader as its notifier: the fill worker that detects the
//! fault only performs a non-blocking `send`, and subscribers surface the
//! fault later on their own tasks.
//!
//! ```text
//!  fill worker ──notify──> EventBus ──recv().await──> host task
//!  reader      ──emit────>
//! ```
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, ReaderEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Reader(ReaderEvent::Closed { hits: 3, misses: 1 }))
//!     .ok();
//!
//! assert!(matches!(
//!     rx.recv().await.unwrap(),
//!     CoreEvent::Reader(ReaderEvent::Closed { hits: 3, .. })
//! ));
//! # }
//! ```
//!
//! A subscriber that falls more than the channel capacity behind gets
//! `RecvError::Lagged(n)` once and then continues with newer events.

use bridge_traits::notify::{IntegrityFaultReport, IntegrityNotifier};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::trace;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Per-subscriber backlog used by [`EventBus::default`].
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

/// Envelope for everything published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Reader(ReaderEvent),
}

impl CoreEvent {
    /// Short label suitable for logs.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Reader(event) => event.label(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Reader(event) => event.severity(),
        }
    }
}

/// How loudly a host should surface an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Info,
    Warning,
    Error,
}

/// Something that happened inside one random-access reader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ReaderEvent {
    /// Buffers and worker streams are allocated.
    Opened {
        source_len: u64,
        buffer_count: usize,
        thread_count: usize,
    },
    /// A fill finished with faulted workers or a hole in the buffer.
    FillDegraded {
        fill_start: u64,
        bytes: usize,
        integrity_faults: usize,
        io_faults: usize,
    },
    /// Decrypted content failed authentication. Sent at most once per reader.
    IntegrityFault {
        /// Offset the failing worker had seeked to.
        offset: u64,
        worker: usize,
        message: String,
    },
    /// Buffers were wiped and streams closed.
    Closed { hits: u64, misses: u64 },
}

impl ReaderEvent {
    fn label(&self) -> &str {
        match self {
            ReaderEvent::Opened { .. } => "Reader opened",
            ReaderEvent::FillDegraded { .. } => "Cache fill degraded",
            ReaderEvent::IntegrityFault { .. } => "Integrity check failed",
            ReaderEvent::Closed { .. } => "Reader closed",
        }
    }

    fn severity(&self) -> EventSeverity {
        match self {
            ReaderEvent::IntegrityFault { .. } => EventSeverity::Error,
            ReaderEvent::FillDegraded { .. } => EventSeverity::Warning,
            ReaderEvent::Opened { .. } | ReaderEvent::Closed { .. } => EventSeverity::Info,
        }
    }
}

impl From<&IntegrityFaultReport> for ReaderEvent {
    fn from(report: &IntegrityFaultReport) -> Self {
        ReaderEvent::IntegrityFault {
            offset: report.offset,
            worker: report.worker,
            message: report.message.clone(),
        }
    }
}

/// Cloneable publisher over a `tokio::sync::broadcast` channel.
///
/// `emit` never blocks and does not need a running runtime, so fill
/// workers on plain threads can publish directly.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// `capacity` is the backlog each subscriber may accumulate before it lags.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to every current subscriber.
    ///
    /// Fails only when nobody is subscribed; callers that do not care use `.ok()`.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// New receiver for events published from now on.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

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
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl IntegrityNotifier for EventBus {
    fn notify_integrity_fault(&self, report: &IntegrityFaultReport) {
        let event = CoreEvent::Reader(ReaderEvent::from(report));
        if self.emit(event).is_err() {
            trace!(offset = report.offset, "integrity fault published with no subscribers");
        }
    }
}

type EventPredicate = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Receiver that skips events not matching an optional predicate.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventSeverity, EventStream};
///
/// let bus = EventBus::new(16);
/// let faults = EventStream::new(bus.subscribe())
///     .filter(|event| event.severity() == EventSeverity::Error);
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    predicate: Option<EventPredicate>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            predicate: None,
        }
    }

    /// Keep only events for which `predicate` returns `true`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }

    /// Wait for the next matching event.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged` when events were dropped for this subscriber,
    /// `RecvError::Closed` once every bus handle is gone.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Next matching event already queued, or `None` if there is none.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        use broadcast::error::TryRecvError;

        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Lagged(n)) => return Some(Err(RecvError::Lagged(n))),
                Err(TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.predicate.as_ref().map_or(true, |predicate| predicate(event))
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("filtered", &self.predicate.is_some())
            .finish()
    }
}
