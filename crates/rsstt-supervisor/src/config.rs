//! Supervisor configuration.
//!
//! Aggregates the configuration of every supervised piece with the few
//! service-level settings the supervisor needs itself. Loading it from a
//! file is left to the embedding service; any serde format works.

use std::time::Duration;

use rsstt_logfilter::FilterConfig;
use rsstt_shutdown::ShutdownConfig;
use rsstt_watchdog::{EscalationConfig, WatchdogConfig};
use serde::{Deserialize, Serialize};

use crate::error::{SupervisorError, SupervisorResult};

/// Dependency targets logged at `info` in debug mode and `warn` otherwise.
pub const DEFAULT_MUTED_TARGETS: &[&str] = &[
    "hyper",
    "h2",
    "reqwest",
    "sqlx",
    "teloxide",
    "tokio_util",
];

/// Dependency targets logged at `error` in debug mode and silenced otherwise.
pub const DEFAULT_SHUT_UP_TARGETS: &[&str] = &["sqlx::query"];

/// Complete supervisor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Raise log verbosity. Has no effect on supervision behavior.
    pub debug: bool,
    /// Chat that receives operator notifications.
    pub manager: Option<String>,
    /// Watchdog delays.
    pub watchdog: WatchdogConfig,
    /// Escalation thresholds.
    pub escalation: EscalationConfig,
    /// Teardown bounds.
    pub shutdown: ShutdownConfig,
    /// Log sources and patterns.
    pub filters: FilterConfig,
    /// Noisy dependency targets.
    pub muted_targets: Vec<String>,
    /// Very noisy dependency targets.
    pub shut_up_targets: Vec<String>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            debug: false,
            manager: None,
            watchdog: WatchdogConfig::default(),
            escalation: EscalationConfig::default(),
            shutdown: ShutdownConfig::default(),
            filters: FilterConfig::default(),
            muted_targets: DEFAULT_MUTED_TARGETS.iter().map(ToString::to_string).collect(),
            shut_up_targets: DEFAULT_SHUT_UP_TARGETS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl SupervisorConfig {
    /// Validate this configuration and every nested one.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(&self) -> SupervisorResult<()> {
        self.watchdog.validate()?;
        self.escalation.validate()?;
        self.shutdown.validate()?;
        self.filters.validate()?;
        if self.manager.as_deref().is_some_and(str::is_empty) {
            return Err(SupervisorError::invalid_configuration(
                "manager must not be empty when set",
            ));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> SupervisorConfigBuilder {
        SupervisorConfigBuilder::default()
    }
}

/// Builder for `SupervisorConfig`.
#[derive(Debug, Default)]
pub struct SupervisorConfigBuilder {
    config: SupervisorConfig,
}

impl SupervisorConfigBuilder {
    /// Enable debug verbosity.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Set the operator chat.
    #[must_use]
    pub fn manager(mut self, manager: impl Into<String>) -> Self {
        self.config.manager = Some(manager.into());
        self
    }

    /// Set the delay before the first expiry.
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.config.watchdog.initial_delay = delay;
        self
    }

    /// Set the re-arm delay used after a heartbeat.
    #[must_use]
    pub fn all_clear_delay(mut self, delay: Duration) -> Self {
        self.config.watchdog.all_clear_delay = delay;
        self
    }

    /// Set the escalation thresholds.
    #[must_use]
    pub fn escalation(mut self, escalation: EscalationConfig) -> Self {
        self.config.escalation = escalation;
        self
    }

    /// Set the teardown bounds.
    #[must_use]
    pub fn shutdown(mut self, shutdown: ShutdownConfig) -> Self {
        self.config.shutdown = shutdown;
        self
    }

    /// Set the log sources and patterns.
    #[must_use]
    pub fn filters(mut self, filters: FilterConfig) -> Self {
        self.config.filters = filters;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> SupervisorResult<SupervisorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
