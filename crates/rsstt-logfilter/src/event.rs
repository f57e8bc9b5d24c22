//! Log records as seen by the classifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a log record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    /// Diagnostic detail (`TRACE` and `DEBUG`).
    Debug,
    /// Routine operation.
    Info,
    /// Something unexpected that the service survived.
    Warning,
    /// An operation failed.
    Error,
    /// The service is about to stop.
    Critical,
}

impl LogLevel {
    /// Map a `tracing` level. `critical` marks an error-level event that
    /// carries the `critical = true` field.
    #[must_use]
    pub fn from_tracing(level: tracing::Level, critical: bool) -> Self {
        if level == tracing::Level::ERROR {
            if critical { Self::Critical } else { Self::Error }
        } else if level == tracing::Level::WARN {
            Self::Warning
        } else if level == tracing::Level::INFO {
            Self::Info
        } else {
            Self::Debug
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A single formatted log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Name of the emitting log source (the `tracing` target).
    pub source: String,
    /// Record severity.
    pub level: LogLevel,
    /// Fully formatted message text.
    pub message: String,
}

impl LogEvent {
    /// Create a new log event.
    #[must_use]
    pub fn new(source: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            level,
            message: message.into(),
        }
    }
}
