//! Per-execution context handed to every task action.
//!
//! A [`TaskContext`] couples an absolute deadline with a cancellation token.
//! The deadline is checked against the clock, so [`TaskContext::err`] reports
//! [`ContextError::DeadlineExceeded`] from the ceiling instant onward even if
//! the action never yields back to the worker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::ContextError;

/// Execution context for one run of a task action.
///
/// Cheap to clone; all clones observe the same cancellation and deadline.
#[derive(Debug, Clone)]
pub struct TaskContext {
    task_id: Arc<str>,
    deadline: Instant,
    token: CancellationToken,
}

impl TaskContext {
    /// Create a context for `task_id` that expires at `deadline`.
    #[must_use]
    pub fn new(task_id: impl Into<Arc<str>>, deadline: Instant) -> Self {
        Self {
            task_id: task_id.into(),
            deadline,
            token: CancellationToken::new(),
        }
    }

    /// Create a context expiring `timeout` from now.
    #[must_use]
    pub fn with_timeout(task_id: impl Into<Arc<str>>, timeout: Duration) -> Self {
        let now = Instant::now();
        Self::new(task_id, now.checked_add(timeout).unwrap_or(now))
    }

    /// Identifier of the task this context belongs to.
    #[must_use]
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Absolute deadline of this execution.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left until the deadline, zero once it passed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Why the context is done, or `None` while it is still live.
    ///
    /// The deadline takes precedence over explicit cancellation.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        if Instant::now() >= self.deadline {
            Some(ContextError::DeadlineExceeded)
        } else if self.token.is_cancelled() {
            Some(ContextError::Canceled)
        } else {
            None
        }
    }

    /// `true` once the context is canceled or past its deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Resolves when the context is canceled or the deadline passes.
    pub async fn done(&self) {
        tokio::select! {
            () = self.token.cancelled() => {}
            () = tokio::time::sleep_until(self.deadline.into()) => {}
        }
    }

    /// Return `Ok(())` while live, the reason as an error otherwise.
    ///
    /// # Errors
    ///
    /// Returns the [`ContextError`] once the context is done.
    pub fn check(&self) -> Result<(), ContextError> {
        self.err().map_or(Ok(()), Err)
    }

    /// Cancel the context. Idempotent.
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }
}
