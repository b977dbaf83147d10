//! The dispatcher: sole owner of the priority queue.
//!
//! One dedicated thread merges submissions from the ingress queue into a
//! [`DelayQueue`] and promotes due tasks to the ready hand-off. Because no
//! other thread touches the heap, it needs no lock.
//!
//! ```text
//! producers ─► ingress ─► dispatcher (DelayQueue) ─► ready ─► workers
//!                            ▲
//!                  wake timer │ shutdown
//! ```
//!
//! The dispatcher blocks on three sources at once: a new submission, the wake
//! timer armed for the earliest deadline, and the shutdown broadcast. Tasks are
//! promoted in non-decreasing due-time order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{after, at, select, Receiver, SendTimeoutError, Sender};
use tracing::{debug, info, warn};

use super::audit::{AuditAction, AuditTrail};
use super::lifecycle::is_signalled;
use super::stats::SchedulerCounters;
use super::{DelayQueue, DelayedTask};

/// Longest single blocking wait on a full ready hand-off before shutdown is re-checked.
const HANDOFF_SLICE: Duration = Duration::from_millis(10);

/// Result of handing one due task to the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandOff {
    Promoted,
    Dropped,
    Shutdown,
}

/// What woke the dispatcher.
enum Wake {
    Submitted(DelayedTask),
    Timer,
    IngressClosed,
    Shutdown,
}

/// Dispatcher timing limits.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DispatcherLimits {
    /// Wake interval when the queue is empty.
    pub idle_wake: Duration,
    /// Total wait on a full ready hand-off before a due task is dropped.
    pub handoff_timeout: Duration,
}

pub(crate) struct Dispatcher {
    ingress: Receiver<DelayedTask>,
    ready: Sender<DelayedTask>,
    shutdown: Receiver<()>,
    queue: DelayQueue,
    limits: DispatcherLimits,
    counters: Arc<SchedulerCounters>,
    audit: AuditTrail,
}

impl Dispatcher {
    pub fn new(
        ingress: Receiver<DelayedTask>,
        ready: Sender<DelayedTask>,
        shutdown: Receiver<()>,
        limits: DispatcherLimits,
        counters: Arc<SchedulerCounters>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            ingress,
            ready,
            shutdown,
            queue: DelayQueue::new(),
            limits,
            counters,
            audit,
        }
    }

    /// Run until shutdown or until every producer handle is gone.
    pub fn run(mut self) {
        debug!("Dispatcher started");
        let ingress = self.ingress.clone();
        let shutdown = self.shutdown.clone();
        let mut timer = self.arm_timer();

        loop {
            let wake = select! {
                recv(shutdown) -> _ => Wake::Shutdown,
                recv(ingress) -> msg => msg.map_or(Wake::IngressClosed, Wake::Submitted),
                recv(timer) -> _ => Wake::Timer,
            };

            match wake {
                Wake::Submitted(task) => {
                    if self.enqueue(task) {
                        timer = self.arm_timer();
                    }
                }
                Wake::Timer => {
                    if !self.drain_due() {
                        break;
                    }
                    timer = self.arm_timer();
                }
                Wake::IngressClosed => {
                    debug!("Ingress queue closed");
                    break;
                }
                Wake::Shutdown => break,
            }
        }

        self.discard_remaining();
        info!("Dispatcher stopped");
    }

    /// Merge a submission. Returns `true` when it became the earliest-due task.
    fn enqueue(&mut self, task: DelayedTask) -> bool {
        debug!(
            task_id = task.id(),
            due_in = ?task.execute_at().saturating_duration_since(Instant::now()),
            "Task merged into priority queue"
        );
        let earliest = self.queue.push(task);
        SchedulerCounters::incr(&self.counters.pending);
        earliest
    }

    /// Timer channel firing at the earliest deadline, or after the idle interval.
    ///
    /// A deadline already in the past fires immediately.
    fn arm_timer(&self) -> Receiver<Instant> {
        self.queue
            .next_deadline()
            .map_or_else(|| after(self.limits.idle_wake), at)
    }

    /// Promote every due task. Returns `false` if shutdown interrupted the drain.
    fn drain_due(&mut self) -> bool {
        let now = Instant::now();
        while let Some(task) = self.queue.pop_due(now) {
            SchedulerCounters::decr(&self.counters.pending);
            match self.hand_off(task) {
                HandOff::Promoted | HandOff::Dropped => {}
                HandOff::Shutdown => return false,
            }
        }
        true
    }

    /// Blocking send with a bounded total wait. A task that cannot be handed
    /// off in time is dropped and counted rather than retried forever.
    fn hand_off(&self, task: DelayedTask) -> HandOff {
        let id = task.id().to_string();
        let labels = task.labels().clone();
        let deadline = Instant::now() + self.limits.handoff_timeout;
        let mut task = task;

        loop {
            if self.shutdown_requested() {
                self.discard(&id, &labels);
                return HandOff::Shutdown;
            }
            let slice = deadline
                .saturating_duration_since(Instant::now())
                .min(HANDOFF_SLICE);
            match self.ready.send_timeout(task, slice) {
                Ok(()) => {
                    SchedulerCounters::incr(&self.counters.promoted);
                    self.audit.record(&id, &labels, AuditAction::Promoted, None);
                    debug!(task_id = %id, "Task promoted to ready hand-off");
                    return HandOff::Promoted;
                }
                Err(SendTimeoutError::Timeout(returned)) => {
                    if Instant::now() >= deadline {
                        SchedulerCounters::incr(&self.counters.handoff_dropped);
                        self.audit.record(
                            &id,
                            &labels,
                            AuditAction::Dropped,
                            Some("ready hand-off full".into()),
                        );
                        warn!(
                            task_id = %id,
                            waited = ?self.limits.handoff_timeout,
                            "Ready hand-off full, dropping due task"
                        );
                        return HandOff::Dropped;
                    }
                    task = returned;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    // Every worker has exited.
                    self.discard(&id, &labels);
                    return HandOff::Shutdown;
                }
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        is_signalled(&self.shutdown)
    }

    fn discard(&self, id: &str, labels: &super::TaskLabels) {
        SchedulerCounters::incr(&self.counters.discarded_on_shutdown);
        self.audit.record(id, labels, AuditAction::Discarded, None);
    }

    /// Drop everything still queued or waiting on ingress. At-most-once: none of it runs.
    fn discard_remaining(&mut self) {
        let pending = self.queue.drain();
        let pending_count = pending.len();
        for task in pending {
            SchedulerCounters::decr(&self.counters.pending);
            self.discard(task.id(), task.labels());
        }

        let mut ingress_count = 0usize;
        for task in self.ingress.try_iter() {
            ingress_count += 1;
            self.discard(task.id(), task.labels());
        }

        if pending_count + ingress_count > 0 {
            warn!(
                pending = pending_count,
                ingress = ingress_count,
                "Discarded tasks that had not run at shutdown"
            );
        }
    }
}
