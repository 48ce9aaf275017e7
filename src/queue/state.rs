//! # Queue state accounting: slots, statuses, clear detection, grace window.
//!
//! All mutation happens under the queue's state lock; the methods here are
//! synchronous and cheap. The drain loop and completion paths call into this
//! module and publish events only after releasing the lock.
//!
//! ## Rules
//! - Task status is monotonic: `Pending → Running → Done`, never reversed,
//!   never skipped.
//! - Done slots are removed immediately; the collection only ever holds
//!   pending and running work, in insertion order.
//! - Every decision derived from "the queue is clear" must be re-verified
//!   under the lock immediately before acting on it — a reading goes stale
//!   the instant the lock is released.

use std::collections::VecDeque;

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::queue::handle::Outcome;

/// Status of one queued task. Monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskStatus {
    /// Accepted, not yet dispatched.
    Pending,
    /// Dispatched to the executor; outcome outstanding.
    Running,
    /// Outcome arrived (success or failure); slot is about to be released.
    Done,
}

/// Run status of the queue as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunStatus {
    Stopped,
    Running,
}

impl RunStatus {
    #[inline]
    pub(crate) fn is_running(self) -> bool {
        matches!(self, RunStatus::Running)
    }
}

/// A pending stop: the queue went clear at `since`, with `enqueue_seq`
/// enqueues observed so far. The stop commits only if the queue is still
/// clear after the grace period and the sequence is unchanged.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GraceWindow {
    pub since: Instant,
    pub enqueue_seq: u64,
}

/// One unit of queued work.
pub(crate) struct Slot<R, T> {
    pub id: u64,
    pub status: TaskStatus,
    /// Opaque request payload; owned exclusively until dispatch.
    pub request: Option<R>,
    /// Resolution side of the completion handle; taken exactly once.
    pub resolve: Option<oneshot::Sender<Outcome<T>>>,
}

/// Aggregate queue state: insertion-ordered tasks plus run control.
pub(crate) struct QueueState<R, T> {
    pub tasks: VecDeque<Slot<R, T>>,
    pub run: RunStatus,
    next_id: u64,
    /// Bumped on every enqueue; lets a pending stop detect intervening work.
    enqueue_seq: u64,
    grace: Option<GraceWindow>,
}

impl<R, T> QueueState<R, T> {
    pub(crate) fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
            run: RunStatus::Stopped,
            next_id: 0,
            enqueue_seq: 0,
            grace: None,
        }
    }

    /// Appends a `Pending` slot and abandons any pending stop.
    pub(crate) fn push(&mut self, request: R, resolve: oneshot::Sender<Outcome<T>>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.enqueue_seq += 1;
        self.grace = None;
        self.tasks.push_back(Slot {
            id,
            status: TaskStatus::Pending,
            request: Some(request),
            resolve: Some(resolve),
        });
        id
    }

    pub(crate) fn running_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|s| s.status == TaskStatus::Running)
            .count()
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|s| s.status == TaskStatus::Pending)
            .count()
    }

    /// Clear ⇔ no task is `Pending` or `Running`.
    pub(crate) fn is_clear(&self) -> bool {
        !self
            .tasks
            .iter()
            .any(|s| matches!(s.status, TaskStatus::Pending | TaskStatus::Running))
    }

    /// Selects pending tasks for dispatch, in insertion order, capped so the
    /// number of running tasks never exceeds `throttle`. Selected slots are
    /// marked `Running` and their requests moved out.
    pub(crate) fn select_for_dispatch(&mut self, throttle: usize) -> Vec<(u64, R)> {
        let budget = throttle.saturating_sub(self.running_count());
        let mut batch = Vec::new();
        for slot in self.tasks.iter_mut() {
            if batch.len() == budget {
                break;
            }
            if slot.status == TaskStatus::Pending {
                slot.status = TaskStatus::Running;
                if let Some(request) = slot.request.take() {
                    batch.push((slot.id, request));
                }
            }
        }
        batch
    }

    /// Drives the slot to `Done`, releases it, and returns the resolver.
    ///
    /// Returns `None` if the id is unknown (already completed).
    pub(crate) fn complete(&mut self, id: u64) -> Option<oneshot::Sender<Outcome<T>>> {
        let idx = self.tasks.iter().position(|s| s.id == id)?;
        debug_assert_eq!(self.tasks[idx].status, TaskStatus::Running);
        self.tasks[idx].status = TaskStatus::Done;
        self.tasks.remove(idx).and_then(|slot| slot.resolve)
    }

    /// Re-evaluates clear detection at `now`.
    ///
    /// Opens a grace window the first time the queue is observed clear;
    /// closes it again if work reappeared.
    pub(crate) fn observe(&mut self, now: Instant) {
        if self.is_clear() {
            let seq = self.enqueue_seq;
            self.grace.get_or_insert(GraceWindow {
                since: now,
                enqueue_seq: seq,
            });
        } else {
            self.grace = None;
        }
    }

    /// True if the queue has been clear for at least `grace` with no
    /// intervening enqueue. Re-verifies clearness; callers hold the lock
    /// from this check through [`QueueState::commit_stop`].
    pub(crate) fn should_stop(&self, now: Instant, grace: std::time::Duration) -> bool {
        self.run.is_running()
            && self.is_clear()
            && self.grace.is_some_and(|w| {
                w.enqueue_seq == self.enqueue_seq
                    && now.saturating_duration_since(w.since) >= grace
            })
    }

    /// Commits the stop: `Running → Stopped`. No-op bookkeeping beyond that;
    /// calling this while already stopped would be redundant and is guarded
    /// by [`QueueState::should_stop`].
    pub(crate) fn commit_stop(&mut self) {
        self.run = RunStatus::Stopped;
        self.grace = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn push_n(state: &mut QueueState<u32, u32>, n: u32) -> Vec<u64> {
        (0..n)
            .map(|i| {
                let (tx, _rx) = oneshot::channel();
                state.push(i, tx)
            })
            .collect()
    }

    #[test]
    fn test_push_assigns_increasing_ids() {
        let mut state = QueueState::new();
        let ids = push_n(&mut state, 3);
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(state.pending_count(), 3);
        assert!(!state.is_clear());
    }

    #[test]
    fn test_dispatch_selects_in_insertion_order() {
        let mut state = QueueState::new();
        push_n(&mut state, 5);

        let batch = state.select_for_dispatch(2);
        let ids: Vec<u64> = batch.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(state.running_count(), 2);
        assert_eq!(state.pending_count(), 3);
    }

    #[test]
    fn test_dispatch_budget_accounts_for_running() {
        let mut state = QueueState::new();
        push_n(&mut state, 5);

        assert_eq!(state.select_for_dispatch(3).len(), 3);
        // 3 already running: only 1 more fits under a throttle of 4.
        assert_eq!(state.select_for_dispatch(4).len(), 1);
        assert_eq!(state.running_count(), 4);
        // Saturated: nothing fits under a throttle below the running count.
        assert!(state.select_for_dispatch(2).is_empty());
    }

    #[test]
    fn test_complete_releases_the_slot() {
        let mut state = QueueState::new();
        push_n(&mut state, 2);
        state.select_for_dispatch(10);

        assert!(state.complete(0).is_some());
        assert!(state.complete(0).is_none());
        assert_eq!(state.running_count(), 1);

        assert!(state.complete(1).is_some());
        assert!(state.is_clear());
        assert!(state.tasks.is_empty());
    }

    #[test]
    fn test_grace_opens_on_clear_and_expires() {
        let mut state: QueueState<u32, u32> = QueueState::new();
        state.run = RunStatus::Running;

        let t0 = Instant::now();
        state.observe(t0);
        assert!(!state.should_stop(t0, Duration::from_secs(1)));
        assert!(state.should_stop(t0 + Duration::from_secs(1), Duration::from_secs(1)));

        state.commit_stop();
        assert!(!state.run.is_running());
        assert!(!state.should_stop(t0 + Duration::from_secs(5), Duration::from_secs(1)));
    }

    #[test]
    fn test_enqueue_abandons_pending_stop() {
        let mut state: QueueState<u32, u32> = QueueState::new();
        state.run = RunStatus::Running;

        let t0 = Instant::now();
        state.observe(t0);

        let (tx, _rx) = oneshot::channel();
        state.push(1, tx);
        assert!(!state.should_stop(t0 + Duration::from_secs(5), Duration::from_secs(1)));

        // Dispatch and complete the new task: the grace restarts from the
        // fresh observation, not the stale one.
        state.select_for_dispatch(1);
        let _ = state.complete(state.tasks[0].id);
        let t1 = t0 + Duration::from_secs(6);
        state.observe(t1);
        assert!(!state.should_stop(t1, Duration::from_secs(1)));
        assert!(state.should_stop(t1 + Duration::from_secs(1), Duration::from_secs(1)));
    }

    #[test]
    fn test_observe_while_busy_closes_window() {
        let mut state: QueueState<u32, u32> = QueueState::new();
        state.run = RunStatus::Running;

        let t0 = Instant::now();
        state.observe(t0);
        let (tx, _rx) = oneshot::channel();
        state.push(1, tx);
        state.observe(t0 + Duration::from_millis(100));
        assert!(!state.should_stop(t0 + Duration::from_secs(10), Duration::from_secs(1)));
    }
}
