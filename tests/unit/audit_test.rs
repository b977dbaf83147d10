//! Tests for audit sink

use delayed_task_scheduler::core::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, TaskLabels,
};

fn labels() -> TaskLabels {
    TaskLabels {
        name: Some("report mail".to_string()),
        category: Some("sales".to_string()),
        created_at_ms: 1_700_000_000_000,
    }
}

#[test]
fn test_in_memory_audit_sink() {
    let sink = InMemoryAuditSink::new(10);

    let event = build_audit_event("task1", &labels(), AuditAction::Submitted, None);
    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0], event);
    assert_eq!(events[0].task_id, "task1");
    assert_eq!(events[0].action, AuditAction::Submitted);
    assert_eq!(events[0].name.as_deref(), Some("report mail"));
}

#[test]
fn test_audit_sink_overflow() {
    let sink = InMemoryAuditSink::new(2);

    for id in ["t1", "t2", "t3"] {
        sink.record(build_audit_event(id, &labels(), AuditAction::Promoted, None));
    }

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].task_id, "t2");
    assert_eq!(events[1].task_id, "t3");
}

#[test]
fn test_event_ids_are_unique() {
    let a = build_audit_event("t", &labels(), AuditAction::Started, None);
    let b = build_audit_event("t", &labels(), AuditAction::Started, None);
    assert_ne!(a.event_id, b.event_id);
    assert!(a.created_at_ms > 0);
}

#[test]
fn test_filter_by_action() {
    let sink = InMemoryAuditSink::new(10);
    sink.record(build_audit_event("a", &labels(), AuditAction::Completed, None));
    sink.record(build_audit_event("b", &labels(), AuditAction::Failed, Some("boom".into())));
    sink.record(build_audit_event("c", &labels(), AuditAction::Completed, None));

    assert_eq!(sink.task_ids(AuditAction::Completed), vec!["a", "c"]);
    assert_eq!(sink.task_ids(AuditAction::Failed), vec!["b"]);
    assert!(sink.task_ids(AuditAction::Dropped).is_empty());
}

#[test]
fn test_audit_event_serializes_action_in_snake_case() {
    let event = build_audit_event("t", &labels(), AuditAction::TimedOut, None);
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"action\":\"timed_out\""));

    let back: AuditEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back.action, AuditAction::TimedOut);
}
