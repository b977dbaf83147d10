//! # Delayed Task Scheduler
//!
//! An in-process scheduler that runs a task once after a delay, without
//! blocking the code that submitted it.
//!
//! Typical consumers are request handlers that need "do X after Y elapses",
//! e.g. sending a notification some time after a report was generated. The
//! caller supplies the action; the scheduler never inspects it.
//!
//! ## Architecture
//!
//! ```text
//! producers ─► ingress queue ─► dispatcher (timing heap) ─► ready hand-off ─► workers
//! ```
//!
//! - **Single-writer heap**: one dispatcher thread owns the time-ordered heap,
//!   so the heap is never locked. Producers reach it through a bounded
//!   multi-producer queue.
//! - **Bounded everywhere**: the ingress queue and the ready hand-off are both
//!   bounded. A task that cannot be placed within its wait ceiling is dropped,
//!   counted and logged, and submission reports it to the caller.
//! - **Per-task ceiling**: every run gets a [`core::TaskContext`] with an
//!   absolute deadline. Async actions are cut at the deadline; blocking
//!   actions still see it through [`core::TaskContext::err`].
//! - **At-most-once**: no persistence and no retry. Tasks still queued at
//!   shutdown are discarded.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use delayed_task_scheduler::builders::SchedulerBuilder;
//!
//! let scheduler = SchedulerBuilder::new().build()?;
//! scheduler.start(4)?;
//!
//! scheduler.schedule("report-7-mail", Duration::from_secs(30), |ctx| async move {
//!     ctx.check()?;
//!     // deliver the mail...
//!     Ok(())
//! })?;
//!
//! let outcome = scheduler.stop();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling: tasks, ordering, dispatch, execution and lifecycle.
pub mod core;
/// Configuration models for capacities, timeouts and worker counts.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
