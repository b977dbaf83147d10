//! Tests for error types

use delayed_task_scheduler::core::{AppResult, ContextError, SchedulerError, TaskContext};
use std::time::Duration;

#[test]
fn test_queue_full_error() {
    let err = SchedulerError::QueueFull("mail-7".to_string());
    assert_eq!(format!("{}", err), "queue full: task mail-7 dropped");
}

#[test]
fn test_shutdown_error() {
    assert_eq!(SchedulerError::Shutdown.to_string(), "scheduler is shut down");
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("ready_capacity must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: ready_capacity must be greater than 0"
    );
}

#[test]
fn test_spawn_error_from_io() {
    let io = std::io::Error::other("no threads left");
    let err: SchedulerError = io.into();
    assert!(matches!(err, SchedulerError::Spawn(_)));
    assert_eq!(err.to_string(), "failed to spawn scheduler thread: no threads left");
}

#[test]
fn test_context_errors() {
    assert_eq!(ContextError::Canceled.to_string(), "context canceled");
    assert_eq!(
        ContextError::DeadlineExceeded.to_string(),
        "context deadline exceeded"
    );
}

#[test]
fn test_context_error_converts_into_app_result() {
    fn action(ctx: &TaskContext) -> AppResult<()> {
        ctx.check()?;
        Ok(())
    }

    let expired = TaskContext::with_timeout("a", Duration::ZERO);
    let err = action(&expired).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ContextError>(),
        Some(&ContextError::DeadlineExceeded)
    );
}
