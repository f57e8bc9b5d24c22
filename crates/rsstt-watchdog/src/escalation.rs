//! Failure-count escalation policy.
//!
//! Each failure signal bumps a counter. Every `notify_every`-th failure asks
//! for an operator notification; once the counter has reached `terminal_at`
//! the notification turns into a restart announcement and the caller is told
//! to shut the process down. A heartbeat resets the counter to zero.
//!
//! The policy only decides. Sending messages and shutting down is left to the
//! owner of the policy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{WatchdogError, WatchdogResult};

/// Failures between two operator notifications.
pub const DEFAULT_NOTIFY_EVERY: u32 = 5;

/// Failure count at which a notification becomes a restart.
pub const DEFAULT_TERMINAL_AT: u32 = 15;

/// Escalation thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Notify the operator whenever the count is a multiple of this.
    pub notify_every: u32,
    /// Escalate to shutdown on a notification at or above this count.
    pub terminal_at: u32,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            notify_every: DEFAULT_NOTIFY_EVERY,
            terminal_at: DEFAULT_TERMINAL_AT,
        }
    }
}

impl EscalationConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either threshold is zero.
    pub fn validate(&self) -> WatchdogResult<()> {
        if self.notify_every == 0 {
            return Err(WatchdogError::invalid_configuration(
                "notify_every must be greater than 0",
            ));
        }
        if self.terminal_at == 0 {
            return Err(WatchdogError::invalid_configuration(
                "terminal_at must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// What the owner of the policy should do after a failure signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationAction {
    /// Nothing to report yet.
    Quiet,
    /// Send `text` to the operator without waiting for delivery.
    Notify {
        /// Failure count that triggered the notification.
        count: u32,
        /// Composed operator message.
        text: String,
    },
    /// Send `text` to the operator and shut the process down.
    Terminate {
        /// Failure count that triggered the escalation.
        count: u32,
        /// Composed operator message.
        text: String,
    },
}

impl EscalationAction {
    /// The operator message, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Quiet => None,
            Self::Notify { text, .. } | Self::Terminate { text, .. } => Some(text),
        }
    }

    /// Whether the action requires a shutdown.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminate { .. })
    }
}

/// Monotonic failure counter with notify and terminate thresholds.
#[derive(Debug, Clone, Default)]
pub struct EscalationPolicy {
    config: EscalationConfig,
    count: u32,
}

impl EscalationPolicy {
    /// Create a policy with a zero count.
    #[must_use]
    pub fn new(config: EscalationConfig) -> Self {
        Self { config, count: 0 }
    }

    /// Current failure count.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Record a failure and decide how to escalate.
    ///
    /// `message` is the raw log line that triggered the failure; it is quoted
    /// verbatim at the end of any notification.
    pub fn on_failure_signal(&mut self, message: &str) -> EscalationAction {
        self.count = self.count.saturating_add(1);
        let count = self.count;

        if self.config.notify_every == 0 || !count.is_multiple_of(self.config.notify_every) {
            return EscalationAction::Quiet;
        }

        let terminal = count >= self.config.terminal_at;
        let text = compose_notification(count, terminal, message);
        if terminal {
            EscalationAction::Terminate { count, text }
        } else {
            EscalationAction::Notify { count, text }
        }
    }

    /// Record a heartbeat. Returns the count that was cleared.
    pub fn on_success_signal(&mut self) -> u32 {
        std::mem::take(&mut self.count)
    }
}

impl fmt::Display for EscalationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failures (notify every {}, restart at {})",
            self.count, self.config.notify_every, self.config.terminal_at
        )
    }
}

fn compose_notification(count: u32, terminal: bool, message: &str) -> String {
    let advice = if terminal {
        "Now the bot will restart."
    } else {
        "Please store the log and restart.\n(sometimes it may be caused by too many subscriptions)"
    };
    format!("RSS monitor tasks have conflicted too many times ({count})!\n{advice}\n\n{message}")
}
