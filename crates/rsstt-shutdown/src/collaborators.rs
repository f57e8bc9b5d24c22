//! External collaborators the teardown sequence drives.
//!
//! The coordinator owns their lifecycle during teardown. Nothing else may
//! disconnect the client or close storage while a shutdown is running.

use async_trait::async_trait;

/// Error type returned by collaborators.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Chat client used for operator notifications.
#[async_trait]
pub trait BotClient: Send + Sync {
    /// Whether the client currently holds a live connection.
    fn is_connected(&self) -> bool;

    /// Close the connection.
    async fn disconnect(&self) -> Result<(), CollaboratorError>;

    /// Send `text` to `destination`.
    async fn send_message(&self, destination: &str, text: &str) -> Result<(), CollaboratorError>;
}

/// Persistent storage with pooled connections.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Close every open connection. Must tolerate being called on a closed
    /// store.
    async fn close_all_connections(&self) -> Result<(), CollaboratorError>;
}
