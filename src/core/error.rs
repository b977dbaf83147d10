//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The ingress queue stayed full past the submission wait ceiling; the task was dropped.
    #[error("queue full: task {0} dropped")]
    QueueFull(String),
    /// The scheduler has been stopped and no longer accepts work.
    #[error("scheduler is shut down")]
    Shutdown,
    /// Configuration or argument validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A dispatcher or worker thread could not be spawned.
    #[error("failed to spawn scheduler thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Why a task's execution context is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context was canceled before its deadline.
    #[error("context canceled")]
    Canceled,
    /// The per-task deadline has passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Application-facing result using anyhow for task actions.
pub type AppResult<T> = Result<T, anyhow::Error>;
