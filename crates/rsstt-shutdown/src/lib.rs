//! # rsstt-shutdown
//!
//! Escalation-driven shutdown for the RSStT background service.
//!
//! Every path out of the service goes through [`ShutdownCoordinator`]. A
//! shutdown is bounded in time and always ends with a non-zero exit, so the
//! outer service manager restarts the process.
//!
//! - [`coordinator`] - the one-shot teardown sequence
//! - [`collaborators`] - the bot client and storage traits it drives
//! - [`request`] - shutdown requests and their optional prerequisite
//! - [`terminate`] - how the process is finally ended
//! - [`error`] - shutdown error types

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod collaborators;
pub mod coordinator;
pub mod error;
pub mod request;
pub mod terminate;

pub mod prelude;

pub use collaborators::{BotClient, CollaboratorError, ConnectionStore};
pub use coordinator::{
    DEFAULT_PREREQUISITE_TIMEOUT, ShutdownConfig, ShutdownCoordinator, ShutdownCoordinatorBuilder,
    ShutdownOutcome,
};
pub use error::{ShutdownError, ShutdownResult};
pub use request::{Prerequisite, ShutdownRequest};
pub use terminate::{EXIT_CODE, ProcessTerminator, SystemTerminator};
