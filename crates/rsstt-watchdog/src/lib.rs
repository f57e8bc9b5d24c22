//! # rsstt-watchdog
//!
//! Liveness watchdog and failure escalation for the RSStT background service.
//!
//! The background job scheduler has no health API. Its progress is inferred
//! from two signals: heartbeats (a job finished) and failures (a job run was
//! skipped because the previous one was still running). This crate holds the
//! two stateful pieces that react to those signals:
//!
//! - [`watchdog`] - a resettable deadline timer that fires once on silence
//! - [`escalation`] - a failure counter with notify and terminate thresholds
//! - [`timer`] - the timer backends the watchdog schedules on
//! - [`error`] - watchdog-specific error types
//!
//! Neither piece sends messages or stops the process itself; the owner wires
//! the expiry handler and acts on [`EscalationAction`]s.
//!
//! ## Example
//!
//! ```rust
//! use rsstt_watchdog::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let timer = ManualTimer::new();
//! let watchdog = WatchdogTimer::new(Arc::new(timer.clone()), Arc::new(|_delay| {}));
//! watchdog.arm(Duration::from_secs(300))?;
//!
//! timer.advance(Duration::from_secs(301));
//! assert_eq!(watchdog.phase(), WatchdogPhase::Expired);
//! # Ok::<(), WatchdogError>(())
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod escalation;
pub mod timer;
pub mod watchdog;

pub mod prelude;

pub use error::{WatchdogError, WatchdogResult};
pub use escalation::{EscalationAction, EscalationConfig, EscalationPolicy};
pub use timer::{ManualTimer, TimerCallback, TimerDriver, TimerHandle, TokioTimer};
pub use watchdog::{
    ExpiryHandler, WatchdogConfig, WatchdogConfigBuilder, WatchdogPhase, WatchdogTimer,
    expiry_message,
};
