//! Throttled task queue: dispatch, completion, and run control.
//!
//! This module contains the queue runtime. The public API is
//! [`TaskQueue`] / [`QueueBuilder`] plus the seams it is wired through:
//! - [`Execute`], [`ExecuteFn`], [`ExecutorRef`] — the injected operation
//!   executor;
//! - [`CompletionHandle`] — the per-task single-resolution future.
//!
//! Internal modules:
//! - `state`: slot accounting, clear detection, and the grace window;
//! - `queue`: enqueue path, drain loop, and the stop protocol.

mod executor;
mod handle;
#[allow(clippy::module_inception)]
mod queue;
mod state;

pub use executor::{Execute, ExecuteFn, ExecutorRef};
pub use handle::CompletionHandle;
pub use queue::{QueueBuilder, TaskQueue};
