//! Shutdown requests.

use std::fmt;

use futures::future::BoxFuture;

use crate::collaborators::CollaboratorError;

/// Deferred operation the teardown waits on before touching collaborators.
///
/// Typically the last operator notification.
pub type Prerequisite = BoxFuture<'static, Result<(), CollaboratorError>>;

/// A request to terminate the process.
pub struct ShutdownRequest {
    reason: String,
    prerequisite: Option<Prerequisite>,
}

impl ShutdownRequest {
    /// Create a request without a prerequisite.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            prerequisite: None,
        }
    }

    /// Wait on `prerequisite` before tearing down.
    #[must_use]
    pub fn with_prerequisite(mut self, prerequisite: Prerequisite) -> Self {
        self.prerequisite = Some(prerequisite);
        self
    }

    /// Why the shutdown was requested.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Whether a prerequisite is attached.
    #[must_use]
    pub fn has_prerequisite(&self) -> bool {
        self.prerequisite.is_some()
    }

    pub(crate) fn into_parts(self) -> (String, Option<Prerequisite>) {
        (self.reason, self.prerequisite)
    }
}

impl fmt::Debug for ShutdownRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownRequest")
            .field("reason", &self.reason)
            .field("has_prerequisite", &self.prerequisite.is_some())
            .finish()
    }
}
