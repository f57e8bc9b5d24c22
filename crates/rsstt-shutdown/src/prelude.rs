//! Prelude module for convenient imports

pub use crate::collaborators::{BotClient, CollaboratorError, ConnectionStore};
pub use crate::coordinator::{ShutdownConfig, ShutdownCoordinator, ShutdownOutcome};
pub use crate::error::{ShutdownError, ShutdownResult};
pub use crate::request::{Prerequisite, ShutdownRequest};
pub use crate::terminate::{EXIT_CODE, ProcessTerminator, SystemTerminator};
