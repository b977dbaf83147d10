//! Tests for builder modules

use delayed_task_scheduler::builders::SchedulerBuilder;
use delayed_task_scheduler::config::SchedulerConfig;
use delayed_task_scheduler::core::{AuditAction, InMemoryAuditSink, SchedulerError, ShutdownOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn test_builder_defaults() {
    let builder = SchedulerBuilder::new();
    assert_eq!(builder.config(), &SchedulerConfig::default());
}

#[test]
fn test_builder_configure() {
    let builder = SchedulerBuilder::new().configure(|c| c.with_worker_count(2).with_ready_capacity(8));
    assert_eq!(builder.config().worker_count, 2);
    assert_eq!(builder.config().ready_capacity, 8);
}

#[test]
fn test_builder_rejects_invalid_config() {
    let result = SchedulerBuilder::from_config(SchedulerConfig::default().with_ingress_capacity(0)).build();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[test]
fn test_builder_wires_audit_sink() {
    let sink = Arc::new(InMemoryAuditSink::new(32));
    let scheduler = SchedulerBuilder::new()
        .configure(|c| c.with_worker_count(1))
        .with_audit(sink.clone())
        .build()
        .unwrap();
    scheduler.start_default().unwrap();
    scheduler
        .schedule("built", Duration::ZERO, |_ctx| async { Ok(()) })
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    while scheduler.stats().completed == 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(scheduler.stop(), ShutdownOutcome::Completed);
    assert_eq!(sink.task_ids(AuditAction::Completed), vec!["built"]);
}
