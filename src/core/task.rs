//! Task model: the unit of schedulable work and the action abstraction.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AppResult, TaskContext};
use crate::util::clock::{clamp_to_now, due_in, now_ms};

/// Boxed future returned by a task action.
pub type BoxActionFuture = Pin<Box<dyn Future<Output = AppResult<()>> + Send + 'static>>;

/// Type-erased, run-once task action.
pub type Action = Box<dyn FnOnce(TaskContext) -> BoxActionFuture + Send + 'static>;

/// Struct-based task action.
///
/// Closures are the common way to schedule work; implement this trait when the
/// deferred work is a reusable component, e.g. a notifier that owns a client.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use delayed_task_scheduler::core::{AppResult, TaskAction, TaskContext};
///
/// struct SendReportMail {
///     recipient: String,
/// }
///
/// #[async_trait]
/// impl TaskAction for SendReportMail {
///     async fn run(&self, ctx: TaskContext) -> AppResult<()> {
///         ctx.check()?;
///         // deliver the mail...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait TaskAction: Send + Sync + 'static {
    /// Run the action once under `ctx`.
    async fn run(&self, ctx: TaskContext) -> AppResult<()>;
}

/// Bookkeeping attached to a task for logs and audit events.
///
/// Labels carry no scheduling semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLabels {
    /// Human-readable task name.
    pub name: Option<String>,
    /// Free-form category, e.g. the kind of report a notification follows.
    pub category: Option<String>,
    /// Submission time in milliseconds since the Unix epoch.
    pub created_at_ms: u128,
}

/// A delayed task: an opaque action due at an absolute instant.
pub struct DelayedTask {
    id: String,
    execute_at: Instant,
    labels: TaskLabels,
    action: Action,
}

impl DelayedTask {
    /// Create a task due `delay` from now.
    pub fn new<F, Fut>(id: impl Into<String>, delay: Duration, action: F) -> Self
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        Self::from_action(id, due_in(delay), boxed(action))
    }

    /// Create a task due at `at`; an instant in the past means "as soon as possible".
    pub fn at<F, Fut>(id: impl Into<String>, at: Instant, action: F) -> Self
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        Self::from_action(id, clamp_to_now(at), boxed(action))
    }

    /// Create a task that runs a shared [`TaskAction`] `delay` from now.
    pub fn with_action(id: impl Into<String>, delay: Duration, action: Arc<dyn TaskAction>) -> Self {
        Self::from_action(id, due_in(delay), boxed(move |ctx| async move { action.run(ctx).await }))
    }

    fn from_action(id: impl Into<String>, execute_at: Instant, action: Action) -> Self {
        Self {
            id: id.into(),
            execute_at,
            labels: TaskLabels {
                created_at_ms: now_ms(),
                ..TaskLabels::default()
            },
            action,
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.labels.name = Some(name.into());
        self
    }

    /// Attach a category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.labels.category = Some(category.into());
        self
    }

    /// Caller-supplied identifier; not required to be unique.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute due instant.
    #[must_use]
    pub const fn execute_at(&self) -> Instant {
        self.execute_at
    }

    /// Bookkeeping labels.
    #[must_use]
    pub const fn labels(&self) -> &TaskLabels {
        &self.labels
    }

    /// `true` once the due instant has been reached at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.execute_at <= now
    }

    /// Split the task into its identifier, labels and action for execution.
    pub(crate) fn into_parts(self) -> (String, TaskLabels, Action) {
        (self.id, self.labels, self.action)
    }
}

fn boxed<F, Fut>(action: F) -> Action
where
    F: FnOnce(TaskContext) -> Fut + Send + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    Box::new(move |ctx: TaskContext| -> BoxActionFuture { Box::pin(action(ctx)) })
}

impl fmt::Debug for DelayedTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayedTask")
            .field("id", &self.id)
            .field("execute_at", &self.execute_at)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}
