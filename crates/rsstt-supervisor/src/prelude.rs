//! Prelude module for convenient imports

pub use crate::config::SupervisorConfig;
pub use crate::error::{SupervisorError, SupervisorResult};
pub use crate::logging;
pub use crate::notify::OperatorChannel;
pub use crate::supervisor::Supervisor;

pub use rsstt_logfilter::{ClassifyingFilter, FilterConfig};
pub use rsstt_shutdown::{
    BotClient, ConnectionStore, Prerequisite, ShutdownConfig, ShutdownOutcome,
};
pub use rsstt_watchdog::{EscalationAction, EscalationConfig, WatchdogConfig, WatchdogPhase};
