//! Audit sink implementations.
//!
//! Audit events mirror the task lifecycle (submit, promote, start, outcome,
//! drop) and are observability-only: a sink never influences scheduling.

use std::collections::VecDeque;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::TaskLabels;
use crate::util::clock::now_ms;

/// Lifecycle step recorded by an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Accepted onto the ingress queue.
    Submitted,
    /// Handed from the priority queue to the ready hand-off.
    Promoted,
    /// Picked up by a worker.
    Started,
    /// Action returned `Ok`.
    Completed,
    /// Action returned an error.
    Failed,
    /// Action hit the per-task ceiling.
    TimedOut,
    /// Dropped because a bounded buffer stayed full.
    Dropped,
    /// Discarded at shutdown without running.
    Discarded,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "submitted",
            Self::Promoted => "promoted",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::Dropped => "dropped",
            Self::Discarded => "discarded",
        };
        f.write_str(s)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: String,
    /// Related task identifier.
    pub task_id: String,
    /// Task name label, if any.
    pub name: Option<String>,
    /// Task category label, if any.
    pub category: Option<String>,
    /// Action taken.
    pub action: AuditAction,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context (error text, drop reason, elapsed time).
    pub detail: Option<String>,
}

/// Audit sink abstraction.
///
/// Called from the dispatcher and worker threads; implementations must be cheap.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: Mutex<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Task ids of stored events with the given action, in recording order.
    #[must_use]
    pub fn task_ids(&self, action: AuditAction) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.action == action)
            .map(|e| e.task_id.clone())
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    task_id: impl Into<String>,
    labels: &TaskLabels,
    action: AuditAction,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        event_id: Uuid::new_v4().to_string(),
        task_id: task_id.into(),
        name: labels.name.clone(),
        category: labels.category.clone(),
        action,
        created_at_ms: now_ms(),
        detail,
    }
}

/// Optional sink shared by the dispatcher and the workers.
#[derive(Clone, Default)]
pub(crate) struct AuditTrail {
    sink: Option<std::sync::Arc<dyn AuditSink>>,
}

impl AuditTrail {
    pub fn new(sink: Option<std::sync::Arc<dyn AuditSink>>) -> Self {
        Self { sink }
    }

    pub fn record(&self, task_id: &str, labels: &TaskLabels, action: AuditAction, detail: Option<String>) {
        if let Some(sink) = &self.sink {
            sink.record(build_audit_event(task_id, labels, action, detail));
        }
    }
}
