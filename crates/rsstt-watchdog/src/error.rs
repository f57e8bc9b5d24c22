//! Error types for the watchdog and escalation policy.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during watchdog operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchdogError {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The watchdog already fired; it cannot be re-armed.
    #[error("Watchdog already expired after {0:?}")]
    AlreadyExpired(Duration),

    /// A zero delay would fire immediately and is rejected.
    #[error("Watchdog delay must be greater than zero")]
    ZeroDelay,

    /// No tokio runtime is available to drive the timer.
    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

impl WatchdogError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Create a missing runtime error.
    #[must_use]
    pub fn no_runtime(reason: impl Into<String>) -> Self {
        Self::NoRuntime(reason.into())
    }

    /// Whether the error describes a terminal watchdog state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AlreadyExpired(_))
    }
}

/// A specialized `Result` type for watchdog operations.
pub type WatchdogResult<T> = std::result::Result<T, WatchdogError>;
