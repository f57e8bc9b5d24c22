//! The supervisor.
//!
//! A [`Supervisor`] owns the liveness state of the service: the watchdog,
//! the escalation counter and the shutdown coordinator. The log filters it
//! hands out hold a reference to it and report signals through
//! [`SignalSink`]; nothing else mutates its state.
//!
//! Signal handlers run inside the `tracing` dispatch of the record that
//! triggered them. A scoped dispatcher drops events emitted re-entrantly
//! there, while the global one delivers them inline. The teardown task logs
//! the shutdown reason again, so it reaches the log under either.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use rsstt_logfilter::{ClassifyingFilter, LogEvent, SignalSink, SourceFilter};
use rsstt_shutdown::{
    BotClient, ConnectionStore, Prerequisite, ProcessTerminator, ShutdownCoordinator,
    ShutdownOutcome, ShutdownRequest,
};
use rsstt_watchdog::{
    EscalationAction, EscalationPolicy, ExpiryHandler, TimerDriver, TokioTimer, WatchdogPhase,
    WatchdogTimer, expiry_message,
};
use tracing::{debug, error, info};

use crate::config::SupervisorConfig;
use crate::error::{SupervisorError, SupervisorResult};
use crate::notify::OperatorChannel;

/// Reason attached to shutdowns requested through [`Supervisor::shutdown`].
const REQUESTED_REASON: &str = "Shutdown requested";

/// Owner of the watchdog, the escalation counter and the shutdown path.
pub struct Supervisor {
    config: SupervisorConfig,
    watchdog: WatchdogTimer,
    escalation: Mutex<EscalationPolicy>,
    coordinator: ShutdownCoordinator,
    channel: Option<OperatorChannel>,
}

impl Supervisor {
    /// Start building a supervisor.
    #[must_use]
    pub fn builder(config: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder {
            config,
            store: None,
            bot: None,
            timer: None,
            terminator: None,
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Current failure count.
    #[must_use]
    pub fn escalation_count(&self) -> u32 {
        self.escalation.lock().count()
    }

    /// Current watchdog phase.
    #[must_use]
    pub fn watchdog_phase(&self) -> WatchdogPhase {
        self.watchdog.phase()
    }

    /// The watchdog itself.
    #[must_use]
    pub fn watchdog(&self) -> &WatchdogTimer {
        &self.watchdog
    }

    /// The shutdown coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &ShutdownCoordinator {
        &self.coordinator
    }

    /// The operator channel, if a bot client and manager chat are configured.
    #[must_use]
    pub fn operator_channel(&self) -> Option<&OperatorChannel> {
        self.channel.as_ref()
    }

    /// Record a job conflict and act on the escalation outcome.
    pub fn on_failure_signal(&self, message: &str) -> EscalationAction {
        let action = self.escalation.lock().on_failure_signal(message);
        match &action {
            EscalationAction::Quiet => {}
            EscalationAction::Notify { count, text } => {
                debug!(count, "Job conflicts reached a notification threshold");
                if let Some(channel) = &self.channel {
                    channel.dispatch(text.clone());
                }
            }
            EscalationAction::Terminate { count, text } => {
                let reason =
                    format!("RSS monitor tasks have conflicted too many times ({count})! Exiting...");
                error!(critical = true, count, "{reason}");
                let prerequisite = self.channel.as_ref().map(|c| c.prepare(text.clone()));
                self.request_shutdown(reason, prerequisite);
            }
        }
        action
    }

    /// Record a successful job run. Clears the failure count and re-arms the
    /// watchdog with the all-clear delay.
    pub fn on_success_signal(&self) -> u32 {
        match self.heartbeat(self.config.watchdog.all_clear_delay) {
            Ok(cleared) => cleared,
            Err(e) => {
                debug!(error = %e, "Watchdog not re-armed");
                0
            }
        }
    }

    /// Heartbeat from outside the job scheduler.
    ///
    /// Same as a successful job run, with an optional custom delay.
    ///
    /// # Errors
    ///
    /// Returns an error if the delay is zero or the watchdog already expired.
    /// The failure count is cleared either way.
    pub fn watchdog_fine(&self, delay: Option<Duration>) -> SupervisorResult<()> {
        self.heartbeat(delay.unwrap_or(self.config.watchdog.all_clear_delay))?;
        Ok(())
    }

    /// Request process termination, optionally after `prerequisite`.
    pub fn shutdown(&self, prerequisite: Option<Prerequisite>) -> ShutdownOutcome {
        self.request_shutdown(REQUESTED_REASON.to_string(), prerequisite)
    }

    /// Per-layer filter for the job scheduler targets, reporting to this
    /// supervisor.
    #[must_use]
    pub fn scheduler_filter(self: &Arc<Self>) -> ClassifyingFilter {
        let sink: Arc<dyn SignalSink> = Arc::clone(self) as Arc<dyn SignalSink>;
        ClassifyingFilter::new(SourceFilter::scheduler(&self.config.filters)).with_sink(sink)
    }

    /// Per-layer filter for the HTTP access-log targets.
    #[must_use]
    pub fn access_log_filter(&self) -> ClassifyingFilter {
        ClassifyingFilter::new(SourceFilter::access_log(&self.config.filters))
    }

    fn heartbeat(&self, delay: Duration) -> SupervisorResult<u32> {
        let cleared = self.escalation.lock().on_success_signal();
        if cleared > 0 {
            debug!(cleared, "Job conflict count cleared");
        }
        self.watchdog.reset(delay)?;
        Ok(cleared)
    }

    fn on_watchdog_expired(&self, delay: Duration) {
        let text = expiry_message(delay);
        error!(critical = true, "{text}");
        let prerequisite = self
            .channel
            .as_ref()
            .map(|c| c.prepare(format!("WATCHDOG: {text}")));
        self.request_shutdown(text, prerequisite);
    }

    fn request_shutdown(&self, reason: String, prerequisite: Option<Prerequisite>) -> ShutdownOutcome {
        let mut request = ShutdownRequest::new(reason);
        if let Some(prerequisite) = prerequisite {
            request = request.with_prerequisite(prerequisite);
        }
        self.coordinator.initiate(request)
    }
}

impl SignalSink for Supervisor {
    fn on_heartbeat(&self, _event: &LogEvent) {
        self.on_success_signal();
    }

    fn on_failure(&self, event: &LogEvent) {
        self.on_failure_signal(&event.message);
    }
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("watchdog", &self.watchdog)
            .field("escalation", &*self.escalation.lock())
            .field("coordinator", &self.coordinator)
            .field("channel", &self.channel)
            .finish()
    }
}

/// Builder for [`Supervisor`].
pub struct SupervisorBuilder {
    config: SupervisorConfig,
    store: Option<Arc<dyn ConnectionStore>>,
    bot: Option<Arc<dyn BotClient>>,
    timer: Option<Arc<dyn TimerDriver>>,
    terminator: Option<Arc<dyn ProcessTerminator>>,
}

impl SupervisorBuilder {
    /// Storage closed during teardown. Required.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn ConnectionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Bot client used for notifications and disconnected during teardown.
    #[must_use]
    pub fn bot(mut self, bot: Arc<dyn BotClient>) -> Self {
        self.bot = Some(bot);
        self
    }

    /// Timer backend for the watchdog. Defaults to the current tokio runtime.
    #[must_use]
    pub fn timer(mut self, timer: Arc<dyn TimerDriver>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Process terminator. Defaults to the real process.
    #[must_use]
    pub fn terminator(mut self, terminator: Arc<dyn ProcessTerminator>) -> Self {
        self.terminator = Some(terminator);
        self
    }

    /// Build the supervisor and arm the watchdog with the initial delay.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the store is
    /// missing, or no timer was given and no tokio runtime is running.
    pub fn build(self) -> SupervisorResult<Arc<Supervisor>> {
        self.config.validate()?;
        let store = self
            .store
            .ok_or(SupervisorError::MissingCollaborator("store"))?;
        let timer: Arc<dyn TimerDriver> = match self.timer {
            Some(timer) => timer,
            None => Arc::new(TokioTimer::current()?),
        };

        let mut coordinator = ShutdownCoordinator::builder(store).config(self.config.shutdown.clone());
        if let Some(bot) = &self.bot {
            coordinator = coordinator.bot(Arc::clone(bot));
        }
        if let Some(terminator) = self.terminator {
            coordinator = coordinator.terminator(terminator);
        }
        let coordinator = coordinator.build()?;

        let channel = match (&self.bot, &self.config.manager) {
            (Some(bot), Some(manager)) => Some(OperatorChannel::new(Arc::clone(bot), manager.clone())),
            _ => None,
        };
        let escalation = Mutex::new(EscalationPolicy::new(self.config.escalation));
        let initial_delay = self.config.watchdog.initial_delay;
        let config = self.config;

        let supervisor = Arc::new_cyclic(|weak: &Weak<Supervisor>| {
            let weak = weak.clone();
            let on_expire: ExpiryHandler = Arc::new(move |delay| {
                if let Some(supervisor) = weak.upgrade() {
                    supervisor.on_watchdog_expired(delay);
                }
            });
            Supervisor {
                config,
                watchdog: WatchdogTimer::new(timer, on_expire),
                escalation,
                coordinator,
                channel,
            }
        });

        supervisor.watchdog.arm(initial_delay)?;
        info!(
            initial_delay_secs = initial_delay.as_secs(),
            notify = supervisor.channel.is_some(),
            "Supervisor started"
        );
        Ok(supervisor)
    }
}

impl fmt::Debug for SupervisorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupervisorBuilder")
            .field("config", &self.config)
            .field("has_store", &self.store.is_some())
            .field("has_bot", &self.bot.is_some())
            .field("has_timer", &self.timer.is_some())
            .field("has_terminator", &self.terminator.is_some())
            .finish()
    }
}
