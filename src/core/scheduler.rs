//! The delayed task scheduler: lifecycle controller and submission API.
//!
//! [`DelayedTaskScheduler`] wires the pieces together. Producers submit onto a
//! bounded ingress queue, one dispatcher thread orders submissions by due time
//! and promotes due tasks to a bounded ready hand-off, and a fixed set of
//! worker threads run them under a per-task ceiling.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use delayed_task_scheduler::config::SchedulerConfig;
//! use delayed_task_scheduler::core::DelayedTaskScheduler;
//!
//! let scheduler = DelayedTaskScheduler::new(SchedulerConfig::default())?;
//! scheduler.start(4)?;
//!
//! scheduler.schedule("notify-42", Duration::from_secs(2), |ctx| async move {
//!     ctx.check()?;
//!     // send the notification...
//!     Ok(())
//! })?;
//!
//! scheduler.stop();
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::audit::{AuditAction, AuditTrail};
use super::dispatcher::{Dispatcher, DispatcherLimits};
use super::lifecycle::{RunState, ShutdownSignal};
use super::stats::SchedulerCounters;
use super::worker::{spawn_worker, WorkerShared};
use super::{AppResult, AuditSink, DelayedTask, SchedulerError, SchedulerStats, TaskAction, TaskContext};
use crate::config::SchedulerConfig;

/// How a call to [`DelayedTaskScheduler::stop`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The dispatcher and every worker exited inside the shutdown ceiling.
    Completed,
    /// The ceiling elapsed first; remaining threads were detached.
    TimedOut,
    /// The scheduler was not running, nothing was done.
    NotRunning,
}

/// Channel ends handed to the threads at start.
struct PendingChannels {
    ingress_rx: Receiver<DelayedTask>,
    ready_tx: Sender<DelayedTask>,
    ready_rx: Receiver<DelayedTask>,
}

/// In-process scheduler running each task once after its delay.
///
/// The scheduler is single-use: once stopped it cannot be restarted. Tasks
/// submitted before [`start`](Self::start) wait in the ingress queue.
///
/// Delivery is at-most-once. Tasks still queued when [`stop`](Self::stop) is
/// called are discarded, and a task is dropped when a bounded buffer stays
/// full past its wait ceiling. Every loss is logged and counted in
/// [`SchedulerStats`].
pub struct DelayedTaskScheduler {
    /// Scheduler configuration.
    config: SchedulerConfig,

    /// Producer end of the ingress queue.
    ingress_tx: Sender<DelayedTask>,

    /// Consumer of the ready hand-off, kept to discard leftovers at stop.
    ready_drain: Receiver<DelayedTask>,

    /// Consumer ends, parked here until the threads are spawned.
    channels: Mutex<Option<PendingChannels>>,

    /// Idle, running or stopped.
    state: RunState,

    /// Broadcast that releases the dispatcher and idle workers.
    signal: ShutdownSignal,

    /// Dispatcher and worker thread handles.
    handles: Mutex<Vec<JoinHandle<()>>>,

    /// Workers requested by the effective `start` call.
    worker_count: AtomicUsize,

    /// Statistics counters (lock-free atomics).
    counters: Arc<SchedulerCounters>,

    /// Optional audit sink.
    audit: AuditTrail,
}

impl DelayedTaskScheduler {
    /// Create a scheduler. Nothing is spawned until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if the configuration is invalid.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        Self::with_trail(config, AuditTrail::default())
    }

    /// Create a scheduler that records lifecycle events to `sink`.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if the configuration is invalid.
    pub fn with_audit(config: SchedulerConfig, sink: Arc<dyn AuditSink>) -> Result<Self, SchedulerError> {
        Self::with_trail(config, AuditTrail::new(Some(sink)))
    }

    fn with_trail(config: SchedulerConfig, audit: AuditTrail) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;

        let (ingress_tx, ingress_rx) = bounded(config.ingress_capacity);
        let (ready_tx, ready_rx) = bounded(config.ready_capacity);

        debug!(
            ingress_capacity = config.ingress_capacity,
            ready_capacity = config.ready_capacity,
            task_timeout = ?config.task_timeout(),
            "Scheduler created"
        );

        Ok(Self {
            config,
            ingress_tx,
            ready_drain: ready_rx.clone(),
            channels: Mutex::new(Some(PendingChannels {
                ingress_rx,
                ready_tx,
                ready_rx,
            })),
            state: RunState::default(),
            signal: ShutdownSignal::new(),
            handles: Mutex::new(Vec::new()),
            worker_count: AtomicUsize::new(0),
            counters: Arc::new(SchedulerCounters::default()),
            audit,
        })
    }

    /// Spawn the dispatcher and `workers` worker threads.
    ///
    /// Idempotent: only the first call, even among concurrent ones, spawns
    /// anything. Calling `start` on a stopped scheduler is a logged no-op.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::InvalidConfig` if `workers` is zero
    /// - `SchedulerError::Spawn` if a thread could not be spawned; the
    ///   scheduler is then stopped
    pub fn start(&self, workers: usize) -> Result<(), SchedulerError> {
        if workers == 0 {
            return Err(SchedulerError::InvalidConfig(
                "worker count must be greater than 0".into(),
            ));
        }

        if !self.state.try_start() {
            if self.state.is_stopped() {
                warn!("start called on a stopped scheduler; ignoring");
            } else {
                debug!("Scheduler already running");
            }
            return Ok(());
        }

        // Held for the whole start so a concurrent stop waits for every handle.
        let mut handles = self.handles.lock();

        let Some(channels) = self.channels.lock().take() else {
            self.state.mark_stopped();
            return Err(SchedulerError::Shutdown);
        };

        let dispatcher = Dispatcher::new(
            channels.ingress_rx,
            channels.ready_tx,
            self.signal.listener(),
            DispatcherLimits {
                idle_wake: self.config.idle_wake(),
                handoff_timeout: self.config.handoff_timeout(),
            },
            Arc::clone(&self.counters),
            self.audit.clone(),
        );
        let spawned = thread::Builder::new()
            .name("ds-dispatcher".into())
            .stack_size(self.config.thread_stack_size)
            .spawn(move || dispatcher.run());
        match spawned {
            Ok(handle) => {
                SchedulerCounters::incr(&self.counters.spawned_dispatchers);
                handles.push(handle);
            }
            Err(e) => {
                self.abort_start(&mut handles);
                return Err(e.into());
            }
        }

        let shared = WorkerShared {
            ready: channels.ready_rx,
            shutdown: self.signal.listener(),
            task_timeout: self.config.task_timeout(),
            counters: Arc::clone(&self.counters),
            audit: self.audit.clone(),
        };
        for worker_id in 0..workers {
            match spawn_worker(worker_id, shared.clone(), self.config.thread_stack_size) {
                Ok(handle) => {
                    SchedulerCounters::incr(&self.counters.spawned_workers);
                    handles.push(handle);
                }
                Err(e) => {
                    self.abort_start(&mut handles);
                    return Err(e.into());
                }
            }
        }

        self.worker_count.store(workers, Ordering::Release);
        info!(
            worker_count = workers,
            ingress_capacity = self.config.ingress_capacity,
            ready_capacity = self.config.ready_capacity,
            "Scheduler started"
        );
        Ok(())
    }

    /// Start with `config.worker_count` workers.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start).
    pub fn start_default(&self) -> Result<(), SchedulerError> {
        self.start(self.config.worker_count)
    }

    fn abort_start(&self, handles: &mut Vec<JoinHandle<()>>) {
        warn!("Failed to spawn scheduler threads; stopping");
        self.state.mark_stopped();
        self.signal.trigger();
        for handle in handles.drain(..) {
            let _ = handle.join();
        }
    }

    /// Stop the scheduler and wait, up to `shutdown_timeout`, for its threads.
    ///
    /// Idle workers and the dispatcher are released at once. Tasks still in
    /// the ingress queue, the priority queue or the ready hand-off are
    /// discarded and counted in `discarded_on_shutdown`. Actions already
    /// running are not canceled; they keep their own deadline. Once `stop`
    /// returns no further action begins.
    pub fn stop(&self) -> ShutdownOutcome {
        if !self.state.try_stop() {
            debug!("stop called on a scheduler that is not running");
            return ShutdownOutcome::NotRunning;
        }

        info!("Stopping scheduler");
        self.signal.trigger();

        let handles = std::mem::take(&mut *self.handles.lock());
        let thread_count = handles.len();
        let timeout = self.config.shutdown_timeout();
        let started = Instant::now();

        let (done_tx, done_rx) = bounded::<usize>(1);
        let joiner = thread::Builder::new()
            .name("ds-shutdown".into())
            .spawn(move || {
                let panicked = handles
                    .into_iter()
                    .map(JoinHandle::join)
                    .filter(Result::is_err)
                    .count();
                let _ = done_tx.send(panicked);
            });
        if let Err(e) = joiner {
            warn!(error = %e, "Failed to spawn shutdown joiner; threads detached");
            return ShutdownOutcome::TimedOut;
        }

        let outcome = match done_rx.recv_timeout(timeout) {
            Ok(0) => {
                info!(threads = thread_count, elapsed = ?started.elapsed(), "Scheduler stopped");
                ShutdownOutcome::Completed
            }
            Ok(panicked) => {
                warn!(threads = thread_count, panicked = panicked, "Scheduler stopped; some threads panicked");
                ShutdownOutcome::Completed
            }
            Err(_) => {
                warn!(
                    threads = thread_count,
                    timeout = ?timeout,
                    "Scheduler threads did not exit within the shutdown ceiling; detaching"
                );
                ShutdownOutcome::TimedOut
            }
        };
        self.discard_ready();
        outcome
    }

    /// Discard tasks promoted but never picked up by a worker.
    ///
    /// Each task is received once, so one a worker discards on its way out is
    /// not counted again here.
    fn discard_ready(&self) {
        let mut count = 0usize;
        for task in self.ready_drain.try_iter() {
            count += 1;
            SchedulerCounters::incr(&self.counters.discarded_on_shutdown);
            self.audit
                .record(task.id(), task.labels(), AuditAction::Discarded, None);
        }
        if count > 0 {
            warn!(ready = count, "Discarded promoted tasks that had not started at shutdown");
        }
    }

    /// Submit a pre-built task.
    ///
    /// Waits up to `submit_timeout` for room on the ingress queue. This is a
    /// blocking call; from async code prefer a short timeout or
    /// `spawn_blocking` under heavy load.
    ///
    /// # Errors
    ///
    /// - `SchedulerError::QueueFull` if the ingress queue stayed full; the
    ///   task is dropped
    /// - `SchedulerError::Shutdown` if the scheduler has been stopped
    pub fn submit(&self, task: DelayedTask) -> Result<(), SchedulerError> {
        if self.state.is_stopped() {
            return Err(SchedulerError::Shutdown);
        }

        let id = task.id().to_string();
        let labels = task.labels().clone();

        match self.ingress_tx.send_timeout(task, self.config.submit_timeout()) {
            Ok(()) => {
                SchedulerCounters::incr(&self.counters.submitted);
                self.audit.record(&id, &labels, AuditAction::Submitted, None);
                debug!(task_id = %id, "Task submitted");
                Ok(())
            }
            Err(SendTimeoutError::Timeout(_)) => {
                SchedulerCounters::incr(&self.counters.submit_dropped);
                self.audit.record(
                    &id,
                    &labels,
                    AuditAction::Dropped,
                    Some("ingress queue full".into()),
                );
                warn!(
                    task_id = %id,
                    waited = ?self.config.submit_timeout(),
                    "Ingress queue full, dropping task"
                );
                Err(SchedulerError::QueueFull(id))
            }
            Err(SendTimeoutError::Disconnected(_)) => Err(SchedulerError::Shutdown),
        }
    }

    /// Schedule `action` to run once, `delay` from now.
    ///
    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub fn schedule<F, Fut>(&self, id: impl Into<String>, delay: Duration, action: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.submit(DelayedTask::new(id, delay, action))
    }

    /// Schedule `action` to run once at `at`. An instant in the past runs as
    /// soon as possible.
    ///
    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub fn schedule_at<F, Fut>(&self, id: impl Into<String>, at: Instant, action: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.submit(DelayedTask::at(id, at, action))
    }

    /// Schedule a shared [`TaskAction`] to run once, `delay` from now.
    ///
    /// # Errors
    ///
    /// See [`submit`](Self::submit).
    pub fn schedule_action(
        &self,
        id: impl Into<String>,
        delay: Duration,
        action: Arc<dyn TaskAction>,
    ) -> Result<(), SchedulerError> {
        self.submit(DelayedTask::with_action(id, delay, action))
    }

    /// Get current scheduler statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.counters
            .snapshot(self.worker_count.load(Ordering::Acquire))
    }

    /// `true` between a successful `start` and `stop`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Scheduler configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

impl Drop for DelayedTaskScheduler {
    fn drop(&mut self) {
        // Release the threads but don't join them here; `stop` is the graceful path.
        if self.state.try_stop() {
            self.signal.trigger();
            debug!("Scheduler dropped without stop; threads detached");
        }
    }
}
