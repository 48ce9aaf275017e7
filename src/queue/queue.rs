//! # TaskQueue: throttled dispatch with race-free start/stop transitions.
//!
//! Accepts operation requests at unbounded caller rate, keeps at most
//! `throttle` operations in flight, and publishes run-state transitions on
//! its embedded [`Bus`].
//!
//! ## Architecture
//! ```text
//! enqueue(request) ─► push Pending slot ─► (Stopped? ─► Running,
//!                                           spawn drain loop,
//!                                           publish QueueStarting)
//!
//! drain loop (one per running period, ticks never overlap):
//!   loop {
//!     ├─► tick (interval, default 500ms)
//!     ├─► select Pending, insertion order, up to throttle − running
//!     │     └─► mark Running, publish TaskDispatched, spawn executor call
//!     └─► clear-detection:
//!           ├─ busy            ─► close grace window, keep looping
//!           ├─ clear, no window ─► open grace window
//!           └─ clear ≥ grace &  ─► re-verify under lock, commit stop,
//!              no enqueue since    publish QueueStopped, exit loop
//!   }
//!
//! executor completion (success, failure, or caught panic):
//!   └─► slot → Done, release slot, publish TaskCompleted/TaskFailed,
//!       re-evaluate clear-detection, resolve the completion handle
//! ```
//!
//! ## Rules
//! - `enqueue` never blocks and never fails; it may be called from
//!   completion handlers (that is what the grace period exists for).
//! - `QueueStarting` fires exactly once per Stopped→Running transition,
//!   `QueueStopped` exactly once per completed grace period.
//! - A failed operation resolves its handle with `Err`, counts toward clear
//!   detection like a success, and never aborts siblings. No retries.
//! - An operation that never completes keeps its slot `Running` forever and
//!   the queue never stops again. That is a documented limitation, not
//!   something the queue papers over.
//!
//! ## Concurrency model
//! Single-threaded cooperative: state is mutated only under one lock, from
//! the enqueue path, the drain tick, and completion callbacks, and every
//! "is clear" reading is re-verified under the lock before acting on it.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tokio::sync::oneshot;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::QueueConfig;
use crate::error::OperationError;
use crate::events::{Bus, Event, EventKind};
use crate::queue::executor::ExecutorRef;
use crate::queue::handle::{CompletionHandle, Outcome};
use crate::queue::state::{QueueState, RunStatus};

/// Throttled task queue over a synchronous event bus.
///
/// Cloning is cheap and clones share the same queue; hand clones to whatever
/// collaborators need to enqueue work or inspect state.
///
/// Constructed with [`TaskQueue::new`] or, when a bus must be shared with
/// other components, via [`TaskQueue::builder`].
pub struct TaskQueue<R, T> {
    inner: Arc<Inner<R, T>>,
}

impl<R, T> Clone for TaskQueue<R, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<R, T> {
    cfg: QueueConfig,
    bus: Bus<Event>,
    exec: ExecutorRef<R, T>,
    state: Mutex<QueueState<R, T>>,
}

/// Builder for constructing a [`TaskQueue`] with an injected bus.
pub struct QueueBuilder<R, T> {
    cfg: QueueConfig,
    exec: ExecutorRef<R, T>,
    bus: Option<Bus<Event>>,
}

impl<R, T> QueueBuilder<R, T>
where
    R: Send + 'static,
    T: Send + 'static,
{
    /// Uses an externally owned bus instead of creating a private one.
    ///
    /// Lets several components publish and subscribe on one shared bus
    /// instance; the queue only ever publishes its own [`EventKind`]s.
    pub fn with_bus(mut self, bus: Bus<Event>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds the queue. It starts `Stopped`; the first enqueue wakes it.
    pub fn build(self) -> TaskQueue<R, T> {
        TaskQueue {
            inner: Arc::new(Inner {
                cfg: self.cfg,
                bus: self.bus.unwrap_or_default(),
                exec: self.exec,
                state: Mutex::new(QueueState::new()),
            }),
        }
    }
}

impl<R, T> TaskQueue<R, T>
where
    R: Send + 'static,
    T: Send + 'static,
{
    /// Creates a builder with the given configuration and executor.
    pub fn builder(cfg: QueueConfig, exec: ExecutorRef<R, T>) -> QueueBuilder<R, T> {
        QueueBuilder {
            cfg,
            exec,
            bus: None,
        }
    }

    /// Creates a queue with a private bus.
    pub fn new(cfg: QueueConfig, exec: ExecutorRef<R, T>) -> Self {
        Self::builder(cfg, exec).build()
    }

    /// The embedded event bus.
    ///
    /// Subscribe to [`EventKind::QueueStarting`] / [`EventKind::QueueStopped`]
    /// for run-state transitions, or to the task kinds for per-task flow.
    pub fn bus(&self) -> &Bus<Event> {
        &self.inner.bus
    }

    /// Enqueues one operation. Never blocks, never fails.
    ///
    /// Appends a `Pending` task and returns its completion handle. If the
    /// queue was stopped it transitions to running, spawns the drain loop,
    /// and publishes [`EventKind::QueueStarting`] — exactly once per
    /// transition. Enqueueing during a grace period abandons the pending
    /// stop.
    ///
    /// Must be called from within a tokio runtime (the drain loop and
    /// executor calls are spawned onto it).
    pub fn enqueue(&self, request: R) -> CompletionHandle<T> {
        let (tx, rx) = oneshot::channel();

        let (id, started) = {
            let mut state = self.inner.lock_state();
            let id = state.push(request, tx);
            let started = if state.run.is_running() {
                false
            } else {
                state.run = RunStatus::Running;
                true
            };
            (id, started)
        };

        if started {
            self.inner.bus.publish(&Event::new(EventKind::QueueStarting));
            tokio::spawn(drain_loop(Arc::clone(&self.inner)));
        }
        self.inner
            .bus
            .publish(&Event::new(EventKind::TaskEnqueued).with_task(id));

        CompletionHandle::new(rx)
    }

    /// True while the drain loop is active.
    pub fn is_running(&self) -> bool {
        self.inner.lock_state().run.is_running()
    }

    /// True when no task is pending or running.
    ///
    /// The reading is stale the instant it returns; the queue itself only
    /// acts on clearness after re-verifying it under the lock.
    pub fn is_clear(&self) -> bool {
        self.inner.lock_state().is_clear()
    }

    /// Number of tasks accepted but not yet dispatched.
    pub fn pending_count(&self) -> usize {
        self.inner.lock_state().pending_count()
    }

    /// Number of operations currently in flight.
    pub fn running_count(&self) -> usize {
        self.inner.lock_state().running_count()
    }
}

impl<R, T> Inner<R, T>
where
    R: Send + 'static,
    T: Send + 'static,
{
    fn lock_state(&self) -> MutexGuard<'_, QueueState<R, T>> {
        // The lock is only ever held for plain field updates; a poisoned
        // guard still holds consistent accounting.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One drain tick: dispatch a batch, then spawn the executor calls.
    fn dispatch_pending(self: &Arc<Self>) {
        let batch = {
            let mut state = self.lock_state();
            state.select_for_dispatch(self.cfg.throttle_clamped())
        };

        for (id, request) in batch {
            self.bus
                .publish(&Event::new(EventKind::TaskDispatched).with_task(id));

            let inner = Arc::clone(self);
            tokio::spawn(async move {
                let call = inner.exec.call(request);
                let outcome = match AssertUnwindSafe(call).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(panic) => Err(OperationError::Panicked {
                        error: panic_message(panic.as_ref()),
                    }),
                };
                inner.finish(id, outcome);
            });
        }
    }

    /// Drives one task to `Done` and resolves its completion handle.
    ///
    /// State is updated and clear-detection re-evaluated before the handle
    /// resolves, so a follow-up enqueue from the handle's awaiter always
    /// observes consistent accounting.
    fn finish(&self, id: u64, outcome: Outcome<T>) {
        let resolve = {
            let mut state = self.lock_state();
            let resolve = state.complete(id);
            state.observe(Instant::now());
            resolve
        };

        match &outcome {
            Ok(_) => self
                .bus
                .publish(&Event::new(EventKind::TaskCompleted).with_task(id)),
            Err(e) => self.bus.publish(
                &Event::new(EventKind::TaskFailed)
                    .with_task(id)
                    .with_reason(e.as_message()),
            ),
        }

        if let Some(tx) = resolve {
            let _ = tx.send(outcome);
        }
    }

    /// Evaluates the stop protocol; returns `true` once the stop committed.
    fn try_stop(&self) -> bool {
        let stopping = {
            let now = Instant::now();
            let mut state = self.lock_state();
            state.observe(now);
            // Re-verified here, under the lock, immediately before acting:
            // a completion handler may have enqueued since the last tick.
            if state.should_stop(now, self.cfg.grace) {
                state.commit_stop();
                true
            } else {
                false
            }
        };

        if stopping {
            self.bus.publish(&Event::new(EventKind::QueueStopped));
        }
        stopping
    }
}

/// Recurring drain tick. One instance runs per Stopped→Running period; it
/// exits when the stop commits, so `run == Running` iff a loop is alive.
async fn drain_loop<R, T>(inner: Arc<Inner<R, T>>)
where
    R: Send + 'static,
    T: Send + 'static,
{
    let mut ticker = time::interval(inner.cfg.tick_clamped());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        inner.dispatch_pending();
        if inner.try_stop() {
            break;
        }
    }
}

/// Renders a panic payload the way panics usually carry messages.
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "opaque panic payload".to_string()
    }
}
