//! Resettable liveness watchdog.
//!
//! A [`WatchdogTimer`] holds at most one live expiry callback. Every
//! [`reset`](WatchdogTimer::reset) cancels the pending callback and schedules
//! a fresh one under the same lock, and each scheduled callback carries the
//! generation it was armed with. A callback whose generation is stale (its
//! cancellation raced with the timer firing) is discarded, so the expiry
//! handler runs at most once per arm/reset cycle.
//!
//! Expiry is terminal: once fired the watchdog stays [`WatchdogPhase::Expired`]
//! and refuses further arming.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::error::{WatchdogError, WatchdogResult};
use crate::timer::{TimerDriver, TimerHandle};

/// Delay before the first expiry when nothing has been heard yet.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(5 * 60);

/// Re-arm delay after a confirmed successful job run.
pub const DEFAULT_ALL_CLEAR_DELAY: Duration = Duration::from_secs(15 * 60);

/// Handler invoked with the armed delay when the watchdog expires.
pub type ExpiryHandler = Arc<dyn Fn(Duration) + Send + Sync>;

/// Compose the operator-facing expiry message for a watchdog delay.
#[must_use]
pub fn expiry_message(delay: Duration) -> String {
    format!(
        "Never heard from the bot for {} seconds. Exiting...",
        delay.as_secs()
    )
}

/// Watchdog delays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Delay for the first arm, before any heartbeat.
    pub initial_delay: Duration,
    /// Delay used when re-arming after a heartbeat.
    pub all_clear_delay: Duration,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            all_clear_delay: DEFAULT_ALL_CLEAR_DELAY,
        }
    }
}

impl WatchdogConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if either delay is zero.
    pub fn validate(&self) -> WatchdogResult<()> {
        if self.initial_delay.is_zero() {
            return Err(WatchdogError::invalid_configuration(
                "initial_delay must be greater than 0",
            ));
        }
        if self.all_clear_delay.is_zero() {
            return Err(WatchdogError::invalid_configuration(
                "all_clear_delay must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> WatchdogConfigBuilder {
        WatchdogConfigBuilder::default()
    }
}

/// Builder for `WatchdogConfig`.
#[derive(Debug, Default)]
pub struct WatchdogConfigBuilder {
    config: WatchdogConfig,
}

impl WatchdogConfigBuilder {
    /// Set the initial silence delay.
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.config.initial_delay = delay;
        self
    }

    /// Set the all-clear re-arm delay.
    #[must_use]
    pub fn all_clear_delay(mut self, delay: Duration) -> Self {
        self.config.all_clear_delay = delay;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> WatchdogResult<WatchdogConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Lifecycle phase of a [`WatchdogTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WatchdogPhase {
    /// Created but never armed, or disarmed.
    #[default]
    Idle,
    /// An expiry callback is pending.
    Armed,
    /// The deadline passed. Terminal.
    Expired,
}

impl fmt::Display for WatchdogPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchdogPhase::Idle => write!(f, "Idle"),
            WatchdogPhase::Armed => write!(f, "Armed"),
            WatchdogPhase::Expired => write!(f, "Expired"),
        }
    }
}

/// Resettable deadline timer that runs an [`ExpiryHandler`] on silence.
#[derive(Clone)]
pub struct WatchdogTimer {
    inner: Arc<WatchdogInner>,
}

struct WatchdogInner {
    driver: Arc<dyn TimerDriver>,
    on_expire: ExpiryHandler,
    state: Mutex<WatchdogState>,
}

#[derive(Debug, Default)]
struct WatchdogState {
    phase: WatchdogPhase,
    delay: Option<Duration>,
    generation: u64,
    pending: Option<Box<dyn TimerHandle>>,
    resets: u64,
}

impl WatchdogTimer {
    /// Create an idle watchdog. Nothing is scheduled until [`arm`](Self::arm).
    #[must_use]
    pub fn new(driver: Arc<dyn TimerDriver>, on_expire: ExpiryHandler) -> Self {
        Self {
            inner: Arc::new(WatchdogInner {
                driver,
                on_expire,
                state: Mutex::new(WatchdogState::default()),
            }),
        }
    }

    /// Arm the watchdog. Arming an armed watchdog behaves like a reset.
    ///
    /// # Errors
    ///
    /// Returns an error if the delay is zero or the watchdog already expired.
    pub fn arm(&self, delay: Duration) -> WatchdogResult<()> {
        self.schedule(delay)
    }

    /// Cancel the pending expiry and schedule a new one after `delay`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delay is zero or the watchdog already expired.
    pub fn reset(&self, delay: Duration) -> WatchdogResult<()> {
        self.schedule(delay)
    }

    /// Cancel the pending expiry without firing.
    pub fn disarm(&self) {
        let mut state = self.inner.state.lock();
        if state.phase != WatchdogPhase::Armed {
            return;
        }
        if let Some(pending) = state.pending.take() {
            pending.cancel();
        }
        state.generation = state.generation.wrapping_add(1);
        state.phase = WatchdogPhase::Idle;
        state.delay = None;
        debug!("Watchdog disarmed");
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> WatchdogPhase {
        self.inner.state.lock().phase
    }

    /// Delay of the current (or last fired) arm.
    #[must_use]
    pub fn delay(&self) -> Option<Duration> {
        self.inner.state.lock().delay
    }

    /// Number of times the watchdog was re-armed while already armed.
    #[must_use]
    pub fn reset_count(&self) -> u64 {
        self.inner.state.lock().resets
    }

    fn schedule(&self, delay: Duration) -> WatchdogResult<()> {
        if delay.is_zero() {
            return Err(WatchdogError::ZeroDelay);
        }

        let mut state = self.inner.state.lock();
        match state.phase {
            WatchdogPhase::Expired => {
                let fired_after = state.delay.unwrap_or(delay);
                return Err(WatchdogError::AlreadyExpired(fired_after));
            }
            WatchdogPhase::Armed => {
                if let Some(pending) = state.pending.take() {
                    pending.cancel();
                }
                state.resets = state.resets.saturating_add(1);
            }
            WatchdogPhase::Idle => {}
        }

        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        let weak: Weak<WatchdogInner> = Arc::downgrade(&self.inner);
        let handle = self.inner.driver.call_later(
            delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    WatchdogInner::fire(&inner, generation);
                }
            }),
        );

        state.pending = Some(handle);
        state.phase = WatchdogPhase::Armed;
        state.delay = Some(delay);
        trace!(delay_secs = delay.as_secs(), generation, "Watchdog armed");
        Ok(())
    }
}

impl WatchdogInner {
    fn fire(inner: &Arc<Self>, generation: u64) {
        let delay = {
            let mut state = inner.state.lock();
            if state.phase != WatchdogPhase::Armed || state.generation != generation {
                debug!(
                    generation,
                    current = state.generation,
                    "Discarding stale watchdog callback"
                );
                return;
            }
            state.phase = WatchdogPhase::Expired;
            state.pending = None;
            state.delay
        };

        let Some(delay) = delay else {
            return;
        };
        error!(
            critical = true,
            delay_secs = delay.as_secs(),
            "Watchdog expired"
        );
        (inner.on_expire)(delay);
    }
}

impl fmt::Debug for WatchdogTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("WatchdogTimer")
            .field("phase", &state.phase)
            .field("delay", &state.delay)
            .field("generation", &state.generation)
            .finish()
    }
}
