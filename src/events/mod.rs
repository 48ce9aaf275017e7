//! Queue events: types and the synchronous bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the task queue.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`], [`Topic`], [`SubscriptionId`] — synchronous ordered fan-out
//!
//! ## Quick reference
//! - **Publisher**: `TaskQueue` (run-state transitions, per-task lifecycle).
//! - **Consumers**: whatever the embedding application subscribes — UI
//!   loading indicators on `QueueStarting`/`QueueStopped`, loggers on the
//!   full stream.
//!
//! The bus is also usable standalone: any type implementing [`Topic`] can be
//! routed through its own `Bus` instance.

mod bus;
mod event;

pub use bus::{Bus, SubscriptionId, Topic};
pub use event::{Event, EventKind};
