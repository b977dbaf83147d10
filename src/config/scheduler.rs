//! Scheduler configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::clock::millis;

/// Prefix for environment overrides read by [`SchedulerConfig::from_env`].
pub const ENV_PREFIX: &str = "DELAYED_SCHEDULER_";

const DEFAULT_INGRESS_CAPACITY: usize = 1000;
const DEFAULT_READY_CAPACITY: usize = 100;
const DEFAULT_SUBMIT_TIMEOUT_MS: u64 = 100;
const DEFAULT_HANDOFF_TIMEOUT_MS: u64 = 1_000;
const DEFAULT_TASK_TIMEOUT_MS: u64 = 2 * 60 * 1_000;
const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_IDLE_WAKE_MS: u64 = 60 * 60 * 1_000;
const DEFAULT_THREAD_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Scheduler configuration.
///
/// Every field has a default, so partial JSON documents are accepted.
/// Timeouts are stored in whole milliseconds; the `with_*` duration setters
/// round a sub-millisecond remainder up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Workers spawned by [`start_default`](crate::core::DelayedTaskScheduler::start_default).
    pub worker_count: usize,
    /// Bound of the ingress queue between producers and the dispatcher.
    pub ingress_capacity: usize,
    /// Bound of the ready hand-off between the dispatcher and the workers.
    pub ready_capacity: usize,
    /// How long a submission waits on a full ingress queue before it is dropped.
    pub submit_timeout_ms: u64,
    /// How long the dispatcher waits on a full ready hand-off before it drops a due task.
    pub handoff_timeout_ms: u64,
    /// Per-task execution ceiling.
    pub task_timeout_ms: u64,
    /// How long `stop` waits for the dispatcher and workers to exit.
    pub shutdown_timeout_ms: u64,
    /// Wake interval of the dispatcher when no task is pending.
    pub idle_wake_ms: u64,
    /// Stack size of the dispatcher and worker threads.
    pub thread_stack_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            ingress_capacity: DEFAULT_INGRESS_CAPACITY,
            ready_capacity: DEFAULT_READY_CAPACITY,
            submit_timeout_ms: DEFAULT_SUBMIT_TIMEOUT_MS,
            handoff_timeout_ms: DEFAULT_HANDOFF_TIMEOUT_MS,
            task_timeout_ms: DEFAULT_TASK_TIMEOUT_MS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            idle_wake_ms: DEFAULT_IDLE_WAKE_MS,
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default worker count.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the ingress queue bound.
    #[must_use]
    pub const fn with_ingress_capacity(mut self, capacity: usize) -> Self {
        self.ingress_capacity = capacity;
        self
    }

    /// Set the ready hand-off bound.
    #[must_use]
    pub const fn with_ready_capacity(mut self, capacity: usize) -> Self {
        self.ready_capacity = capacity;
        self
    }

    /// Set the submission wait ceiling.
    #[must_use]
    pub const fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout_ms = duration_ms(timeout);
        self
    }

    /// Set the dispatcher's wait ceiling on a full ready hand-off.
    #[must_use]
    pub const fn with_handoff_timeout(mut self, timeout: Duration) -> Self {
        self.handoff_timeout_ms = duration_ms(timeout);
        self
    }

    /// Set the per-task execution ceiling.
    #[must_use]
    pub const fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout_ms = duration_ms(timeout);
        self
    }

    /// Set the shutdown wait ceiling.
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = duration_ms(timeout);
        self
    }

    /// Set the idle wake interval.
    #[must_use]
    pub const fn with_idle_wake(mut self, interval: Duration) -> Self {
        self.idle_wake_ms = duration_ms(interval);
        self
    }

    /// Set the stack size of spawned threads.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, size: usize) -> Self {
        self.thread_stack_size = size;
        self
    }

    /// Submission wait ceiling.
    #[must_use]
    pub const fn submit_timeout(&self) -> Duration {
        millis(self.submit_timeout_ms)
    }

    /// Dispatcher wait ceiling on a full ready hand-off.
    #[must_use]
    pub const fn handoff_timeout(&self) -> Duration {
        millis(self.handoff_timeout_ms)
    }

    /// Per-task execution ceiling.
    #[must_use]
    pub const fn task_timeout(&self) -> Duration {
        millis(self.task_timeout_ms)
    }

    /// Shutdown wait ceiling.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        millis(self.shutdown_timeout_ms)
    }

    /// Idle wake interval.
    #[must_use]
    pub const fn idle_wake(&self) -> Duration {
        millis(self.idle_wake_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.ingress_capacity == 0 {
            return Err("ingress_capacity must be greater than 0".into());
        }
        if self.ready_capacity == 0 {
            return Err("ready_capacity must be greater than 0".into());
        }
        if self.task_timeout_ms == 0 {
            return Err("task_timeout_ms must be greater than 0".into());
        }
        if self.shutdown_timeout_ms == 0 {
            return Err("shutdown_timeout_ms must be greater than 0".into());
        }
        if self.idle_wake_ms == 0 {
            return Err("idle_wake_ms must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64 KiB".into());
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    /// Each field can be overridden with `DELAYED_SCHEDULER_<FIELD>`, e.g.
    /// `DELAYED_SCHEDULER_TASK_TIMEOUT_MS=30000`.
    ///
    /// # Errors
    ///
    /// Returns a message naming the variable that failed to parse, or the
    /// validation failure.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup using the same keys as
    /// [`from_env`](Self::from_env).
    ///
    /// # Errors
    ///
    /// Returns a message naming the key that failed to parse, or the
    /// validation failure.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        override_from(&lookup, "WORKER_COUNT", &mut cfg.worker_count)?;
        override_from(&lookup, "INGRESS_CAPACITY", &mut cfg.ingress_capacity)?;
        override_from(&lookup, "READY_CAPACITY", &mut cfg.ready_capacity)?;
        override_from(&lookup, "SUBMIT_TIMEOUT_MS", &mut cfg.submit_timeout_ms)?;
        override_from(&lookup, "HANDOFF_TIMEOUT_MS", &mut cfg.handoff_timeout_ms)?;
        override_from(&lookup, "TASK_TIMEOUT_MS", &mut cfg.task_timeout_ms)?;
        override_from(&lookup, "SHUTDOWN_TIMEOUT_MS", &mut cfg.shutdown_timeout_ms)?;
        override_from(&lookup, "IDLE_WAKE_MS", &mut cfg.idle_wake_ms)?;
        override_from(&lookup, "THREAD_STACK_SIZE", &mut cfg.thread_stack_size)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn override_from<F, T>(lookup: &F, field: &str, slot: &mut T) -> Result<(), String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let key = format!("{ENV_PREFIX}{field}");
    if let Some(raw) = lookup(&key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|e| format!("{key}: invalid value `{raw}`: {e}"))?;
    }
    Ok(())
}

/// Whole milliseconds, rounded up so a sub-millisecond wait never becomes zero.
#[allow(clippy::cast_possible_truncation)]
const fn duration_ms(d: Duration) -> u64 {
    let ms = d.as_millis();
    let ms = if d.subsec_nanos() % 1_000_000 == 0 { ms } else { ms + 1 };
    if ms > u64::MAX as u128 {
        u64::MAX
    } else {
        ms as u64
    }
}
