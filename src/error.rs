//! Error types for queued operations.
//!
//! The queue itself has no failure mode worth a type: `enqueue` always
//! succeeds, and redundant run-state transitions are no-ops. What can fail
//! is an individual operation, and that failure is local to the task's
//! completion handle — it never aborts the drain loop and is never retried
//! by the queue.
//!
//! [`OperationError`] provides helper methods (`as_label`, `as_message`)
//! for logging/metrics.

use thiserror::Error;

/// # Failure of a single queued operation.
///
/// Delivered through the task's [`CompletionHandle`](crate::CompletionHandle).
/// A failed operation still counts toward queue clear-detection exactly like
/// a successful one; sibling tasks are unaffected.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum OperationError {
    /// The executor reported a failure for this operation.
    #[error("operation failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The executor panicked while running this operation.
    ///
    /// The panic is caught so the task can still reach `Done`; an uncaught
    /// panic would leave the slot `Running` forever and the queue would
    /// never drain.
    #[error("operation panicked: {error}")]
    Panicked {
        /// Panic payload rendered as text, when available.
        error: String,
    },

    /// The resolution channel closed before an outcome arrived.
    ///
    /// Not reachable through normal queue operation; surfaces only if the
    /// queue is torn down with the slot unresolved.
    #[error("operation dropped before completion")]
    Dropped,
}

impl OperationError {
    /// Convenience constructor for executor-reported failures.
    pub fn failed(error: impl Into<String>) -> Self {
        OperationError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use drainq::OperationError;
    ///
    /// let err = OperationError::failed("connection refused");
    /// assert_eq!(err.as_label(), "operation_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            OperationError::Failed { .. } => "operation_failed",
            OperationError::Panicked { .. } => "operation_panicked",
            OperationError::Dropped => "operation_dropped",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            OperationError::Failed { error } => format!("error: {error}"),
            OperationError::Panicked { error } => format!("panic: {error}"),
            OperationError::Dropped => "dropped before completion".to_string(),
        }
    }
}
