//! Builder assembling a [`DelayedTaskScheduler`] from configuration.

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::{AuditSink, DelayedTaskScheduler, SchedulerError};

/// Builder for [`DelayedTaskScheduler`].
///
/// ```rust,ignore
/// let sink = Arc::new(InMemoryAuditSink::new(1024));
/// let scheduler = SchedulerBuilder::from_env()?
///     .with_audit(sink.clone())
///     .build()?;
/// ```
#[derive(Default)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    audit: Option<Arc<dyn AuditSink>>,
}

impl SchedulerBuilder {
    /// Start from the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an explicit configuration.
    #[must_use]
    pub fn from_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            audit: None,
        }
    }

    /// Start from the environment, see [`SchedulerConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if a variable fails to parse
    /// or the result is invalid.
    pub fn from_env() -> Result<Self, SchedulerError> {
        SchedulerConfig::from_env()
            .map(Self::from_config)
            .map_err(SchedulerError::InvalidConfig)
    }

    /// Adjust the configuration in place.
    #[must_use]
    pub fn configure(mut self, f: impl FnOnce(SchedulerConfig) -> SchedulerConfig) -> Self {
        self.config = f(self.config);
        self
    }

    /// Record lifecycle events to `sink`.
    #[must_use]
    pub fn with_audit(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Configuration the scheduler will be built with.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validate the configuration and create the scheduler. Nothing is spawned
    /// until `start`.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidConfig` if the configuration is invalid.
    pub fn build(self) -> Result<DelayedTaskScheduler, SchedulerError> {
        match self.audit {
            Some(sink) => DelayedTaskScheduler::with_audit(self.config, sink),
            None => DelayedTaskScheduler::new(self.config),
        }
    }
}
