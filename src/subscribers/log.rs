//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints queue events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [queue-starting]
//! [enqueued] task=0
//! [dispatched] task=0
//! [completed] task=0
//! [failed] task=1 err="error: connection refused"
//! [queue-stopped]
//! ```

use crate::events::{Bus, Event, EventKind, SubscriptionId};

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - subscribe a custom callback for
/// structured logging or metrics collection.
pub struct LogWriter;

impl LogWriter {
    /// Subscribes the writer to every event kind on `bus`.
    ///
    /// Returns the subscription ids so callers can detach the writer with
    /// [`Bus::unsubscribe`] when tearing down.
    pub fn attach(bus: &Bus<Event>) -> Vec<SubscriptionId> {
        EventKind::ALL
            .into_iter()
            .map(|kind| bus.subscribe(kind, Self::write))
            .collect()
    }

    fn write(e: &Event) {
        match e.kind {
            EventKind::QueueStarting => println!("[queue-starting]"),
            EventKind::QueueStopped => println!("[queue-stopped]"),
            EventKind::TaskEnqueued => {
                if let Some(task) = e.task {
                    println!("[enqueued] task={task}");
                }
            }
            EventKind::TaskDispatched => {
                if let Some(task) = e.task {
                    println!("[dispatched] task={task}");
                }
            }
            EventKind::TaskCompleted => {
                if let Some(task) = e.task {
                    println!("[completed] task={task}");
                }
            }
            EventKind::TaskFailed => {
                println!("[failed] task={:?} err={:?}", e.task, e.reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_covers_every_kind() {
        let bus: Bus<Event> = Bus::new();
        let ids = LogWriter::attach(&bus);
        assert_eq!(ids.len(), EventKind::ALL.len());
        for kind in EventKind::ALL {
            assert_eq!(bus.subscriber_count(kind), 1);
        }

        for id in ids {
            assert!(bus.unsubscribe(id));
        }
        assert_eq!(bus.subscriber_count(EventKind::QueueStopped), 0);
    }
}
