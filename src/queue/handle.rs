//! # Completion handle: single-resolution future per enqueued task.
//!
//! [`CompletionHandle`] is resolved exactly once, with the operation's
//! result or failure, when the task reaches `Done`. Awaiting after the
//! outcome has already arrived yields the stored outcome immediately, so it
//! does not matter whether the caller attaches before or after resolution.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::OperationError;

/// Outcome delivered through a [`CompletionHandle`].
pub(crate) type Outcome<T> = Result<T, OperationError>;

/// Completion handle for one enqueued task.
///
/// Returned by [`TaskQueue::enqueue`](crate::TaskQueue::enqueue). Resolves
/// exactly once; an operation failure resolves it with `Err`, it is never
/// retried.
#[derive(Debug)]
pub struct CompletionHandle<T> {
    rx: oneshot::Receiver<Outcome<T>>,
}

impl<T> CompletionHandle<T> {
    pub(crate) fn new(rx: oneshot::Receiver<Outcome<T>>) -> Self {
        Self { rx }
    }
}

impl<T> Future for CompletionHandle<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let rx = &mut self.get_mut().rx;
        match Pin::new(rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_closed)) => Poll::Ready(Err(OperationError::Dropped)),
            Poll::Pending => Poll::Pending,
        }
    }
}
