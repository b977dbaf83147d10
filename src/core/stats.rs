//! Scheduler statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics about scheduler throughput and loss.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Number of workers requested by the effective `start` call.
    pub worker_count: usize,

    /// Dispatcher threads spawned over the scheduler's lifetime.
    pub spawned_dispatchers: u64,

    /// Worker threads spawned over the scheduler's lifetime.
    pub spawned_workers: u64,

    /// Tasks accepted onto the ingress queue.
    pub submitted: u64,

    /// Submissions dropped because the ingress queue stayed full.
    pub submit_dropped: u64,

    /// Tasks currently waiting in the priority queue.
    pub pending: u64,

    /// Tasks handed to the ready hand-off.
    pub promoted: u64,

    /// Due tasks dropped because the ready hand-off stayed full.
    pub handoff_dropped: u64,

    /// Tasks discarded at shutdown without running.
    pub discarded_on_shutdown: u64,

    /// Tasks currently executing.
    pub active: u64,

    /// Tasks whose action returned `Ok`.
    pub completed: u64,

    /// Tasks whose action returned an error.
    pub failed: u64,

    /// Tasks that hit the per-task ceiling.
    pub timed_out: u64,
}

/// Internal counters for scheduler statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    pub spawned_dispatchers: AtomicU64,
    pub spawned_workers: AtomicU64,
    pub submitted: AtomicU64,
    pub submit_dropped: AtomicU64,
    pub pending: AtomicU64,
    pub promoted: AtomicU64,
    pub handoff_dropped: AtomicU64,
    pub discarded_on_shutdown: AtomicU64,
    pub active: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
    pub timed_out: AtomicU64,
}

impl SchedulerCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> SchedulerStats {
        SchedulerStats {
            worker_count,
            spawned_dispatchers: self.spawned_dispatchers.load(Ordering::Relaxed),
            spawned_workers: self.spawned_workers.load(Ordering::Relaxed),
            submitted: self.submitted.load(Ordering::Relaxed),
            submit_dropped: self.submit_dropped.load(Ordering::Relaxed),
            pending: self.pending.load(Ordering::Relaxed),
            promoted: self.promoted.load(Ordering::Relaxed),
            handoff_dropped: self.handoff_dropped.load(Ordering::Relaxed),
            discarded_on_shutdown: self.discarded_on_shutdown.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
        }
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decr(counter: &AtomicU64) {
        counter.fetch_sub(1, Ordering::Relaxed);
    }
}
