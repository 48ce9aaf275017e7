//! # Synchronous publish/subscribe registry.
//!
//! [`Bus`] keeps an ordered list of callbacks per topic key and invokes them
//! inline on `publish`, on the calling thread, in registration order.
//!
//! ## Architecture
//! ```text
//! subscribe(key, cb) ──► [cb, cb, cb]  (per key, registration order)
//!                              │
//! publish(&event) ─────────────┴──► cb(&event)  cb(&event)  cb(&event)
//!                                   (synchronous, ordered, isolated)
//! ```
//!
//! ## Rules
//! - **Synchronous fan-out**: `publish` returns only after every subscriber
//!   for the event's key has run.
//! - **Registration order**: subscribers for one key fire in the order they
//!   subscribed.
//! - **Isolation**: a panicking subscriber does not prevent the remaining
//!   subscribers from running; the panic is caught and reported.
//! - **No subscribers**: publishing to a key nobody listens on is a no-op,
//!   never an error.
//! - **Re-entrancy**: callbacks may subscribe, unsubscribe, or publish on
//!   the same bus; the registration list is snapshotted before invocation,
//!   so mutations take effect from the next publish.
//!
//! ## Injection
//! A `Bus` is always an explicit value handed to the components that need
//! it — there is no process-wide instance. Components that coordinate over
//! unrelated payloads define their own event type (via [`Topic`]) and share
//! their own `Bus` of it; the payload stays opaque to the bus.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, PoisonError, RwLock};

/// An event type that can be routed through a [`Bus`].
///
/// The key selects which subscriber list a published event fans out to.
/// For the queue's own events the key is
/// [`EventKind`](crate::EventKind); collaborators pick whatever cheap,
/// hashable key fits their event type (an enum, a `&'static str`, ...).
pub trait Topic {
    /// Routing key for subscriptions.
    type Key: Copy + Eq + Hash + Send + Sync + 'static;

    /// Returns the key this event is published under.
    fn key(&self) -> Self::Key;
}

/// Identifies one subscription on a [`Bus`], for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// One registered callback.
struct Registration<E: Topic> {
    id: SubscriptionId,
    callback: Arc<dyn Fn(&E) + Send + Sync>,
}

struct BusInner<E: Topic> {
    subs: RwLock<HashMap<E::Key, Vec<Registration<E>>>>,
    next_id: AtomicU64,
}

/// Synchronous, ordered, multi-subscriber event bus.
///
/// ### Properties
/// - **Cloneable**: cheap to clone (shared registry behind an `Arc`); all
///   clones observe the same subscriptions.
/// - **Thread-safe**: callbacks must be `Send + Sync`; publication runs on
///   whichever thread calls `publish`.
pub struct Bus<E: Topic> {
    inner: Arc<BusInner<E>>,
}

impl<E: Topic> Clone for Bus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Topic> Default for Bus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Topic> fmt::Debug for Bus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subs = self
            .inner
            .subs
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Bus")
            .field("topics", &subs.len())
            .field(
                "subscribers",
                &subs.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

impl<E: Topic> Bus<E> {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                subs: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Appends `callback` to the subscriber list for `key`.
    ///
    /// Multiple subscriptions to the same key are allowed and preserved in
    /// registration order. Returns a [`SubscriptionId`] usable with
    /// [`Bus::unsubscribe`] when the listener is torn down.
    pub fn subscribe<F>(&self, key: E::Key, callback: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, AtomicOrdering::Relaxed));
        let mut subs = self
            .inner
            .subs
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        subs.entry(key).or_default().push(Registration {
            id,
            callback: Arc::new(callback),
        });
        id
    }

    /// Removes a subscription. Returns `true` if it was still registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self
            .inner
            .subs
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut removed = false;
        for regs in subs.values_mut() {
            let before = regs.len();
            regs.retain(|r| r.id != id);
            removed |= regs.len() != before;
        }
        removed
    }

    /// Invokes every subscriber registered for `event.key()`, in
    /// registration order, synchronously.
    ///
    /// Each invocation is isolated: a panicking subscriber is caught and
    /// reported, and the remaining subscribers still run. Publishing with
    /// zero subscribers is a no-op.
    pub fn publish(&self, event: &E) {
        let snapshot: Vec<Arc<dyn Fn(&E) + Send + Sync>> = {
            let subs = self
                .inner
                .subs
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match subs.get(&event.key()) {
                Some(regs) => regs.iter().map(|r| Arc::clone(&r.callback)).collect(),
                None => return,
            }
        };

        for callback in snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(event))) {
                eprintln!("[drainq] bus subscriber panicked: {panic:?}");
            }
        }
    }

    /// Number of subscribers currently registered for `key`.
    pub fn subscriber_count(&self, key: E::Key) -> usize {
        let subs = self
            .inner
            .subs
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        subs.get(&key).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Clone)]
    struct Note {
        key: &'static str,
        body: u32,
    }

    impl Topic for Note {
        type Key = &'static str;

        fn key(&self) -> &'static str {
            self.key
        }
    }

    fn note(key: &'static str, body: u32) -> Note {
        Note { key, body }
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus: Bus<Note> = Bus::new();
        bus.publish(&note("nobody-home", 1));
        assert_eq!(bus.subscriber_count("nobody-home"), 0);
    }

    #[test]
    fn test_two_subscribers_fire_once_each_in_order() {
        let bus: Bus<Note> = Bus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&log);
        bus.subscribe("ping", move |e: &Note| {
            first.lock().unwrap().push(("first", e.body));
        });
        let second = Arc::clone(&log);
        bus.subscribe("ping", move |e: &Note| {
            second.lock().unwrap().push(("second", e.body));
        });

        bus.publish(&note("ping", 42));

        let seen = log.lock().unwrap().clone();
        assert_eq!(seen, vec![("first", 42), ("second", 42)]);
    }

    #[test]
    fn test_keys_are_isolated() {
        let bus: Bus<Note> = Bus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&log);
        bus.subscribe("a", move |e: &Note| sink.lock().unwrap().push(e.body));

        bus.publish(&note("b", 1));
        bus.publish(&note("a", 2));

        assert_eq!(log.lock().unwrap().clone(), vec![2]);
    }

    #[test]
    fn test_unsubscribe_detaches_listener() {
        let bus: Bus<Note> = Bus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&log);
        let id = bus.subscribe("a", move |e: &Note| sink.lock().unwrap().push(e.body));

        bus.publish(&note("a", 1));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&note("a", 2));

        assert_eq!(log.lock().unwrap().clone(), vec![1]);
        assert_eq!(bus.subscriber_count("a"), 0);
    }

    #[test]
    fn test_panicking_subscriber_does_not_block_the_rest() {
        let bus: Bus<Note> = Bus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe("a", |_: &Note| panic!("bad subscriber"));
        let sink = Arc::clone(&log);
        bus.subscribe("a", move |e: &Note| sink.lock().unwrap().push(e.body));

        bus.publish(&note("a", 9));

        assert_eq!(log.lock().unwrap().clone(), vec![9]);
    }

    #[test]
    fn test_callbacks_may_reenter_the_bus() {
        let bus: Bus<Note> = Bus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let reentrant = bus.clone();
        let sink = Arc::clone(&log);
        bus.subscribe("outer", move |_: &Note| {
            let inner_sink = Arc::clone(&sink);
            reentrant.subscribe("inner", move |e: &Note| {
                inner_sink.lock().unwrap().push(e.body);
            });
            reentrant.publish(&note("inner", 5));
        });

        bus.publish(&note("outer", 0));

        // The inner subscription lands during the outer publish and fires on
        // the nested publish.
        assert_eq!(log.lock().unwrap().clone(), vec![5]);
        assert_eq!(bus.subscriber_count("inner"), 1);
    }

    #[test]
    fn test_clones_share_the_registry() {
        let bus: Bus<Note> = Bus::new();
        let other = bus.clone();
        let log = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&log);
        bus.subscribe("a", move |e: &Note| sink.lock().unwrap().push(e.body));
        other.publish(&note("a", 3));

        assert_eq!(log.lock().unwrap().clone(), vec![3]);
    }
}
