//! Supervisor error types.

use rsstt_logfilter::FilterError;
use rsstt_shutdown::ShutdownError;
use rsstt_watchdog::WatchdogError;
use thiserror::Error;

/// Errors raised while building or driving a [`Supervisor`](crate::Supervisor).
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Watchdog or escalation failure.
    #[error(transparent)]
    Watchdog(#[from] WatchdogError),

    /// Filter configuration failure.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// Shutdown configuration failure.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),

    /// Invalid supervisor configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A required collaborator was not supplied to the builder.
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// The global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl SupervisorError {
    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a logging initialization error.
    pub fn logging(msg: impl Into<String>) -> Self {
        Self::Logging(msg.into())
    }
}

/// Result type for supervisor operations.
pub type SupervisorResult<T> = Result<T, SupervisorError>;
