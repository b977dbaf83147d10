//! Time-ordered queue of pending tasks.
//!
//! Owned exclusively by the dispatcher thread, so it needs no lock.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use super::DelayedTask;

/// Wrapper making `DelayedTask` orderable by due time (earliest first) and FIFO among equal due times.
struct TimedTask {
    seq: u64,
    task: DelayedTask,
}

impl PartialEq for TimedTask {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for TimedTask {}

impl PartialOrd for TimedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for max-heap: earlier due time wins, then lower sequence.
        other
            .task
            .execute_at()
            .cmp(&self.task.execute_at())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of delayed tasks keyed by absolute due time.
///
/// O(log n) push and pop, O(1) peek of the earliest deadline.
#[derive(Default)]
pub struct DelayQueue {
    next_seq: u64,
    tasks: BinaryHeap<TimedTask>,
}

impl DelayQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task. Returns `true` when it became the earliest-due task.
    pub fn push(&mut self, task: DelayedTask) -> bool {
        let execute_at = task.execute_at();
        let becomes_root = self
            .next_deadline()
            .is_none_or(|current| execute_at < current);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.tasks.push(TimedTask { seq, task });
        becomes_root
    }

    /// Due instant of the earliest task, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.peek().map(|t| t.task.execute_at())
    }

    /// Pop the earliest task if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<DelayedTask> {
        if self.tasks.peek()?.task.is_due(now) {
            self.tasks.pop().map(|t| t.task)
        } else {
            None
        }
    }

    /// Remove every pending task, earliest first.
    pub fn drain(&mut self) -> Vec<DelayedTask> {
        let mut drained = Vec::with_capacity(self.tasks.len());
        while let Some(t) = self.tasks.pop() {
            drained.push(t.task);
        }
        drained
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// `true` when no task is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
