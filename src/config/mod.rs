//! Configuration models for the scheduler: capacities, timeouts, and worker counts.

pub mod scheduler;

pub use scheduler::SchedulerConfig;
