//! Filter configuration errors

use thiserror::Error;

/// Log filter error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A filter has no source targets to listen on
    #[error("Filter '{0}' has no source targets")]
    NoTargets(&'static str),

    /// A match pattern is empty and would match every record
    #[error("Empty match pattern for {0}")]
    EmptyPattern(&'static str),
}

/// Result type for filter configuration
pub type FilterResult<T> = std::result::Result<T, FilterError>;
