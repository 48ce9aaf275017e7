//! # drainq
//!
//! **drainq** is a throttled task queue built on a synchronous
//! publish/subscribe event bus.
//!
//! It fans out a large, dynamically-growing set of independent asynchronous
//! operations against a rate-limited backend, bounding how many run
//! concurrently, and notifies subscribers when a batch starts and when it
//! fully drains. Completion detection and start/stop transitions are
//! race-free even when operations enqueue further operations from their
//! completion handlers.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller ──► TaskQueue::enqueue(request) ──► CompletionHandle (per task)
//!                      │
//!                      │ Stopped → Running: spawn drain loop,
//!                      │                    publish QueueStarting
//!                      ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  drain loop (recurring tick, default 500ms, never overlaps)   │
//! │  - select Pending tasks, insertion order, up to the throttle  │
//! │  - hand each request to the injected Execute impl             │
//! │  - watch for "clear" (no Pending, no Running)                 │
//! └──────┬──────────────────┬──────────────────┬──────────────────┘
//!        ▼                  ▼                  ▼
//!   executor call      executor call      executor call
//!   (outstanding)      (outstanding)      (outstanding)
//!        │                  │                  │
//!        ▼                  ▼                  ▼
//!   resolve handle     resolve handle     resolve handle
//!        │                  │                  │
//!        └────────── Bus (synchronous fan-out) ┘
//!              QueueStarting / QueueStopped / Task* events
//! ```
//!
//! ### Stop protocol
//! ```text
//! tick / completion:
//!   ├─► queue busy  ─► keep running (grace window closed)
//!   └─► queue clear ─► open grace window (default 1s)
//!                        ├─ enqueue arrives ─► abandon pending stop
//!                        └─ still clear after grace
//!                             └─► re-verify under lock ─► Stopped,
//!                                 publish QueueStopped (exactly once)
//! ```
//!
//! The grace window reconciles the race where a task's completion handler
//! enqueues a dependent follow-up task: without it, the queue could declare
//! itself drained while further work is about to start.
//!
//! ## Features
//! | Area            | Description                                               | Key types / traits                       |
//! |-----------------|-----------------------------------------------------------|------------------------------------------|
//! | **Queue**       | Throttled dispatch with race-free start/stop transitions. | [`TaskQueue`], [`QueueBuilder`]          |
//! | **Events**      | Synchronous, ordered, multi-subscriber fan-out.           | [`Bus`], [`Topic`], [`Event`], [`EventKind`] |
//! | **Executor**    | Injected capability that runs one operation.              | [`Execute`], [`ExecuteFn`], [`ExecutorRef`] |
//! | **Completion**  | Per-task single-resolution future.                        | [`CompletionHandle`]                     |
//! | **Errors**      | Typed per-operation failures.                             | [`OperationError`]                       |
//! | **Configuration** | Centralized throttle/tick/grace settings.               | [`QueueConfig`]                          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use drainq::{EventKind, ExecuteFn, ExecutorRef, OperationError, QueueConfig, TaskQueue};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // The executor is an injected capability; the queue only knows that
//!     // it eventually completes or fails.
//!     let executor: ExecutorRef<u32, u32> =
//!         ExecuteFn::arc(|n: u32| async move { Ok::<_, OperationError>(n * 2) });
//!
//!     let queue = TaskQueue::new(QueueConfig::default(), executor);
//!
//!     // UI-style collaborators toggle state on the run-state events.
//!     queue.bus().subscribe(EventKind::QueueStarting, |_| println!("loading..."));
//!     queue.bus().subscribe(EventKind::QueueStopped, |_| println!("idle"));
//!
//!     let first = queue.enqueue(1);
//!     let second = queue.enqueue(2);
//!     assert_eq!(first.await?, 2);
//!     assert_eq!(second.await?, 4);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod queue;

// ---- Public re-exports ----

pub use config::QueueConfig;
pub use error::OperationError;
pub use events::{Bus, Event, EventKind, SubscriptionId, Topic};
pub use queue::{CompletionHandle, Execute, ExecuteFn, ExecutorRef, QueueBuilder, TaskQueue};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod subscribers;
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
