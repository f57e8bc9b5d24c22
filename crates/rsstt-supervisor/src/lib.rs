//! # rsstt-supervisor
//!
//! Liveness supervision for the RSStT bot.
//!
//! The job scheduler exposes no health API, so the [`Supervisor`] reads its
//! log stream instead. Per-layer filters classify scheduler and access-log
//! records; heartbeats re-arm the watchdog and clear the failure count,
//! conflicts escalate from operator notifications to a restart, and silence
//! lets the watchdog expire. Every path out ends in the shutdown
//! coordinator, which always exits with status 1.
//!
//! - [`supervisor`] - the owner of all liveness state
//! - [`notify`] - best-effort operator notifications
//! - [`logging`] - global subscriber setup
//! - [`config`] - aggregated configuration
//! - [`error`] - supervisor error types
//!
//! ## Example
//!
//! ```rust,ignore
//! use rsstt_supervisor::prelude::*;
//!
//! let config = SupervisorConfig::builder().manager("10001").build()?;
//! let supervisor = Supervisor::builder(config.clone())
//!     .store(store)
//!     .bot(bot)
//!     .build()?;
//! logging::init(&config, &supervisor)?;
//! ```

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

pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod supervisor;

pub mod prelude;

pub use config::{SupervisorConfig, SupervisorConfigBuilder};
pub use error::{SupervisorError, SupervisorResult};
pub use notify::OperatorChannel;
pub use supervisor::{Supervisor, SupervisorBuilder};
