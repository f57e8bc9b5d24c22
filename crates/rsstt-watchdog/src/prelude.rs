//! Prelude for rsstt-watchdog.
//!
//! This module re-exports the most commonly used types for convenient importing.
//!
//! # Example
//!
//! ```rust
//! use rsstt_watchdog::prelude::*;
//!
//! let mut policy = EscalationPolicy::new(EscalationConfig::default());
//! assert_eq!(policy.on_failure_signal("skipped"), EscalationAction::Quiet);
//! ```

pub use crate::error::{WatchdogError, WatchdogResult};
pub use crate::escalation::{EscalationAction, EscalationConfig, EscalationPolicy};
pub use crate::timer::{ManualTimer, TimerDriver, TimerHandle, TokioTimer};
pub use crate::watchdog::{
    ExpiryHandler, WatchdogConfig, WatchdogPhase, WatchdogTimer, expiry_message,
};
