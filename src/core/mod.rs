//! Core scheduling: task model, priority queue, dispatcher, workers and the
//! lifecycle controller.

pub mod audit;
pub mod context;
pub mod delay_queue;
pub mod error;
pub mod scheduler;
pub mod stats;
pub mod task;

mod dispatcher;
mod lifecycle;
mod worker;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use context::TaskContext;
pub use delay_queue::DelayQueue;
pub use error::{AppResult, ContextError, SchedulerError};
pub use scheduler::{DelayedTaskScheduler, ShutdownOutcome};
pub use stats::SchedulerStats;
pub use task::{Action, BoxActionFuture, DelayedTask, TaskAction, TaskLabels};
