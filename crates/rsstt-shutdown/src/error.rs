//! Shutdown error types.

use std::time::Duration;

use thiserror::Error;

use crate::collaborators::CollaboratorError;

/// Errors raised while validating or running a shutdown.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The prerequisite did not finish in time. It keeps running detached.
    #[error("Prerequisite did not finish within {0:?}")]
    PrerequisiteTimeout(Duration),

    /// The prerequisite returned an error or panicked.
    #[error("Prerequisite failed: {0}")]
    Prerequisite(#[source] CollaboratorError),

    /// Disconnecting the bot client failed.
    #[error("Failed to disconnect the bot client: {0}")]
    Disconnect(#[source] CollaboratorError),

    /// Closing the storage connections failed.
    #[error("Failed to close storage connections: {0}")]
    StorageClose(#[source] CollaboratorError),

    /// Sending a termination signal to the current process failed.
    #[error("Failed to signal the current process: {0}")]
    Signal(String),
}

impl ShutdownError {
    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a disconnect error.
    pub fn disconnect(err: CollaboratorError) -> Self {
        Self::Disconnect(err)
    }

    /// Create a storage close error.
    pub fn storage_close(err: CollaboratorError) -> Self {
        Self::StorageClose(err)
    }

    /// Create a signal error.
    pub fn signal(msg: impl Into<String>) -> Self {
        Self::Signal(msg.into())
    }

    /// Whether this error came from tearing down a collaborator.
    ///
    /// Teardown failures trigger the last-resort termination signal.
    #[must_use]
    pub fn is_teardown_failure(&self) -> bool {
        matches!(self, Self::Disconnect(_) | Self::StorageClose(_))
    }
}

/// Result type for shutdown operations.
pub type ShutdownResult<T> = Result<T, ShutdownError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShutdownError::PrerequisiteTimeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "Prerequisite did not finish within 10s");

        let err = ShutdownError::disconnect("network is unreachable".into());
        assert_eq!(
            err.to_string(),
            "Failed to disconnect the bot client: network is unreachable"
        );
    }

    #[test]
    fn test_teardown_failures() {
        assert!(ShutdownError::disconnect("x".into()).is_teardown_failure());
        assert!(ShutdownError::storage_close("x".into()).is_teardown_failure());
        assert!(!ShutdownError::PrerequisiteTimeout(Duration::from_secs(1)).is_teardown_failure());
        assert!(!ShutdownError::signal("ESRCH").is_teardown_failure());
    }

    #[test]
    fn test_source_is_preserved() {
        use std::error::Error as _;

        let err = ShutdownError::storage_close("pool closed twice".into());
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("pool closed twice"));
    }
}
