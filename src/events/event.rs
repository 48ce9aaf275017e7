//! # Lifecycle events published by the task queue.
//!
//! The [`EventKind`] enum classifies event types across two categories:
//! - **Queue events**: run-state transitions (starting, stopped)
//! - **Task events**: per-task flow (enqueued, dispatched, completed, failed)
//!
//! The [`Event`] struct carries metadata such as a timestamp, the task id,
//! and a failure reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Within one bus, publication is synchronous and ordered, so
//! subscribers already observe events in `seq` order.
//!
//! ## Example
//! ```rust
//! use drainq::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task(7)
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task, Some(7));
//! assert_eq!(ev.reason.as_deref(), Some("connection refused"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::events::bus::Topic;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of queue events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Queue run-state events ===
    /// The queue transitioned from stopped to running.
    ///
    /// Published exactly once per transition, on the enqueue that woke the
    /// queue. UI collaborators typically show a loading indicator here.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    QueueStarting,

    /// The queue drained and stayed clear through the grace period.
    ///
    /// Published exactly once per completed grace period. UI collaborators
    /// typically restore idle state here.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    QueueStopped,

    // === Task lifecycle events ===
    /// A task was accepted into the queue.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskEnqueued,

    /// A pending task was handed to the operation executor.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskDispatched,

    /// A task's operation completed successfully.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskCompleted,

    /// A task's operation failed (or panicked).
    ///
    /// Failure is local to the task; the queue continues draining.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `reason`: failure message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TaskFailed,
}

impl EventKind {
    /// Every kind, in declaration order. Useful for subscribers that want
    /// the full stream (e.g. loggers).
    pub const ALL: [EventKind; 6] = [
        EventKind::QueueStarting,
        EventKind::QueueStopped,
        EventKind::TaskEnqueued,
        EventKind::TaskDispatched,
        EventKind::TaskCompleted,
        EventKind::TaskFailed,
    ];
}

/// Queue event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Id of the task, if applicable.
    pub task: Option<u64>,
    /// Human-readable reason (failure details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            reason: None,
        }
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, task: u64) -> Self {
        self.task = Some(task);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl Topic for Event {
    type Key = EventKind;

    fn key(&self) -> EventKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::QueueStarting);
        let b = Event::new(EventKind::QueueStopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builders_set_fields() {
        let ev = Event::new(EventKind::TaskFailed)
            .with_task(3)
            .with_reason("boom");
        assert_eq!(ev.task, Some(3));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
        assert_eq!(ev.key(), EventKind::TaskFailed);
    }
}
