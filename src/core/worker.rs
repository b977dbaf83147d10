//! Worker threads draining the ready hand-off.
//!
//! Each worker is a dedicated OS thread with its own single-threaded tokio
//! runtime, so async actions never block the caller's runtime. A worker runs
//! one task at a time under the per-task ceiling and records the outcome in
//! logs, counters and the audit trail. There is no retry and no result channel.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{select, Receiver};
use tracing::{debug, error, info, warn};

use super::audit::{AuditAction, AuditTrail};
use super::lifecycle::is_signalled;
use super::stats::SchedulerCounters;
use super::{ContextError, DelayedTask, TaskContext};

/// State shared by every worker of one scheduler.
#[derive(Clone)]
pub(crate) struct WorkerShared {
    pub ready: Receiver<DelayedTask>,
    pub shutdown: Receiver<()>,
    pub task_timeout: Duration,
    pub counters: Arc<SchedulerCounters>,
    pub audit: AuditTrail,
}

/// How one task run ended.
#[derive(Debug)]
enum Outcome {
    Completed,
    Failed(String),
    TimedOut,
    Panicked,
}

/// Spawn a worker thread.
pub(crate) fn spawn_worker(
    worker_id: usize,
    shared: WorkerShared,
    stack_size: usize,
) -> std::io::Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name(format!("ds-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || worker_loop(worker_id, &shared))?;
    Ok(handle)
}

fn worker_loop(worker_id: usize, shared: &WorkerShared) {
    debug!(worker_id = worker_id, "Worker thread started");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(
                worker_id = worker_id,
                error = %e,
                "Failed to create worker runtime"
            );
            return;
        }
    };

    loop {
        let next = select! {
            recv(shared.shutdown) -> _ => None,
            recv(shared.ready) -> msg => msg.ok(),
        };
        let Some(task) = next else {
            debug!(worker_id = worker_id, "Worker released by shutdown or closed hand-off");
            break;
        };

        // Both arms can be ready at once; never start work after shutdown.
        if is_signalled(&shared.shutdown) {
            SchedulerCounters::incr(&shared.counters.discarded_on_shutdown);
            shared
                .audit
                .record(task.id(), task.labels(), AuditAction::Discarded, None);
            debug!(worker_id = worker_id, task_id = task.id(), "Worker shutdown before task start");
            break;
        }

        run_task(worker_id, &rt, task, shared);
    }

    debug!(worker_id = worker_id, "Worker thread exiting");
}

/// Run one task under its deadline and record the outcome.
fn run_task(worker_id: usize, rt: &tokio::runtime::Runtime, task: DelayedTask, shared: &WorkerShared) {
    let (id, labels, action) = task.into_parts();
    let ctx = TaskContext::with_timeout(id.as_str(), shared.task_timeout);
    let deadline = tokio::time::Instant::from_std(ctx.deadline());

    SchedulerCounters::incr(&shared.counters.active);
    shared.audit.record(&id, &labels, AuditAction::Started, None);
    debug!(
        worker_id = worker_id,
        task_id = %id,
        name = labels.name.as_deref().unwrap_or(""),
        "Worker executing task"
    );

    let started = Instant::now();
    let run_ctx = ctx.clone();
    // The timer must be created inside the runtime.
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        rt.block_on(async { tokio::time::timeout_at(deadline, action(run_ctx)).await })
    }));
    let elapsed = started.elapsed();
    let overran = ctx.err() == Some(ContextError::DeadlineExceeded);
    // Release the context whatever happened; an action that kept a clone sees it as done.
    ctx.cancel();
    SchedulerCounters::decr(&shared.counters.active);

    let outcome = match result {
        // A blocking action can return past its ceiling without yielding.
        Ok(Ok(Ok(()))) if overran => Outcome::TimedOut,
        Ok(Ok(Ok(()))) => Outcome::Completed,
        Ok(Ok(Err(e))) => Outcome::Failed(format!("{e:#}")),
        Ok(Err(_elapsed)) => Outcome::TimedOut,
        Err(_panic) => Outcome::Panicked,
    };

    match outcome {
        Outcome::Completed => {
            SchedulerCounters::incr(&shared.counters.completed);
            shared.audit.record(
                &id,
                &labels,
                AuditAction::Completed,
                Some(format!("{}ms", elapsed.as_millis())),
            );
            info!(worker_id = worker_id, task_id = %id, elapsed = ?elapsed, "Task completed");
        }
        Outcome::Failed(reason) => {
            SchedulerCounters::incr(&shared.counters.failed);
            warn!(worker_id = worker_id, task_id = %id, elapsed = ?elapsed, error = %reason, "Task failed");
            shared
                .audit
                .record(&id, &labels, AuditAction::Failed, Some(reason));
        }
        Outcome::TimedOut => {
            SchedulerCounters::incr(&shared.counters.timed_out);
            shared.audit.record(
                &id,
                &labels,
                AuditAction::TimedOut,
                Some(format!("ceiling {}ms", shared.task_timeout.as_millis())),
            );
            warn!(
                worker_id = worker_id,
                task_id = %id,
                elapsed = ?elapsed,
                ceiling = ?shared.task_timeout,
                "Task exceeded its deadline"
            );
        }
        Outcome::Panicked => {
            SchedulerCounters::incr(&shared.counters.failed);
            shared
                .audit
                .record(&id, &labels, AuditAction::Failed, Some("panicked".into()));
            error!(worker_id = worker_id, task_id = %id, elapsed = ?elapsed, "Task panicked");
        }
    }
}
