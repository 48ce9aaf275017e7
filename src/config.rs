//! # Queue configuration.
//!
//! Provides [`QueueConfig`], the centralized settings for a
//! [`TaskQueue`](crate::TaskQueue).
//!
//! ## Field semantics
//! - `throttle`: bound on concurrently running operations (min 1; clamped)
//! - `tick`: drain tick interval (min 1ms; clamped)
//! - `grace`: how long the queue must stay clear before it commits to stop

use std::time::Duration;

/// Configuration for a [`TaskQueue`](crate::TaskQueue).
///
/// All fields are public for flexibility. Prefer the clamping accessors over
/// reading fields directly so degenerate values (`throttle = 0`, `tick = 0`)
/// never reach the drain loop.
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Maximum number of operations concurrently in flight.
    ///
    /// This bounds outstanding asynchronous operations, not CPU parallelism.
    /// Values below 1 are clamped to 1.
    pub throttle: usize,

    /// Interval between drain ticks.
    ///
    /// Each tick dispatches pending tasks up to the throttle and re-checks
    /// clear-detection. Ticks never overlap. Values below 1ms are clamped.
    pub tick: Duration,

    /// Grace period between detecting a clear queue and committing to stop.
    ///
    /// Guards against the race where a task's completion handler enqueues a
    /// dependent follow-up task: the queue only publishes
    /// [`QueueStopped`](crate::EventKind::QueueStopped) after it has stayed
    /// clear for this long with no intervening enqueue. `Duration::ZERO`
    /// stops at the first tick that observes a clear queue.
    pub grace: Duration,
}

impl QueueConfig {
    /// Returns the throttle clamped to a minimum of 1.
    #[inline]
    pub fn throttle_clamped(&self) -> usize {
        self.throttle.max(1)
    }

    /// Returns the tick interval clamped to a minimum of 1ms.
    ///
    /// The drain loop should use this value; a zero-period interval is
    /// invalid for the runtime timer.
    #[inline]
    pub fn tick_clamped(&self) -> Duration {
        self.tick.max(Duration::from_millis(1))
    }
}

impl Default for QueueConfig {
    /// Default configuration:
    ///
    /// - `throttle = 20`
    /// - `tick = 500ms`
    /// - `grace = 1s`
    fn default() -> Self {
        Self {
            throttle: 20,
            tick: Duration::from_millis(500),
            grace: Duration::from_secs(1),
        }
    }
}
