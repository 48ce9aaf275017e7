//! # Operation executor abstraction and function-backed implementation.
//!
//! This module defines the [`Execute`] trait — the capability the queue
//! dispatches operations through — and a convenient function-backed
//! implementation [`ExecuteFn`]. The common handle type is [`ExecutorRef`],
//! an `Arc<dyn Execute>` suitable for sharing across the queue and its
//! spawned completions.
//!
//! The executor is injected by the caller; the queue has no knowledge of its
//! semantics beyond "it completes or it doesn't."

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::OperationError;

/// Shared reference to an executor.
pub type ExecutorRef<R, T> = Arc<dyn Execute<Request = R, Response = T>>;

/// # Asynchronous operation executor.
///
/// Takes an opaque request descriptor and asynchronously produces either a
/// response or a failure. One call is made per dispatched task; calls for
/// different tasks may be outstanding concurrently, up to the queue's
/// throttle.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use drainq::{Execute, OperationError};
///
/// struct Doubler;
///
/// #[async_trait]
/// impl Execute for Doubler {
///     type Request = u32;
///     type Response = u32;
///
///     async fn call(&self, request: u32) -> Result<u32, OperationError> {
///         Ok(request * 2)
///     }
/// }
/// ```
#[async_trait]
pub trait Execute: Send + Sync + 'static {
    /// Opaque request payload, owned exclusively by the queue until dispatch.
    type Request: Send + 'static;
    /// Result value delivered through the task's completion handle.
    type Response: Send + 'static;

    /// Executes one operation to completion.
    async fn call(&self, request: Self::Request) -> Result<Self::Response, OperationError>;
}

/// Function-backed executor implementation.
///
/// Wraps a closure that *creates* a new future per call, so there is no
/// hidden shared mutable state between operations; if operations need shared
/// state, capture an `Arc<...>` explicitly inside the closure.
#[derive(Debug)]
pub struct ExecuteFn<F, R, Fut> {
    f: F,
    _marker: std::marker::PhantomData<fn(R) -> Fut>,
}

impl<F, R, Fut> ExecuteFn<F, R, Fut> {
    /// Creates a new function-backed executor.
    ///
    /// Prefer [`ExecuteFn::arc`] when you immediately need an
    /// [`ExecutorRef`].
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: std::marker::PhantomData,
        }
    }

    /// Creates the executor and returns it as a shared handle.
    ///
    /// ## Example
    /// ```rust
    /// use drainq::{ExecuteFn, ExecutorRef, OperationError};
    ///
    /// let double: ExecutorRef<u32, u32> =
    ///     ExecuteFn::arc(|n: u32| async move { Ok::<_, OperationError>(n * 2) });
    /// ```
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut, R, T> Execute for ExecuteFn<F, R, Fut>
where
    F: Fn(R) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<T, OperationError>> + Send + 'static,
    R: Send + 'static,
    T: Send + 'static,
{
    type Request = R;
    type Response = T;

    async fn call(&self, request: R) -> Result<T, OperationError> {
        (self.f)(request).await
    }
}
