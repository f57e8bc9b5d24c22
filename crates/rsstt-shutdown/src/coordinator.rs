//! The shutdown coordinator.
//!
//! [`ShutdownCoordinator::initiate`] is the single funnel through which the
//! service terminates. It never blocks the caller: the teardown runs as a
//! detached task on the current runtime, and the first accepted request wins.
//!
//! Teardown order:
//!
//! 1. wait for the request's prerequisite, bounded by
//!    [`ShutdownConfig::prerequisite_timeout`];
//! 2. disconnect the bot client if it reports connected;
//! 3. close all storage connections, whether or not step 2 failed;
//! 4. if step 2 or 3 failed or panicked, send SIGTERM to the current process;
//! 5. exit with [`ShutdownConfig::exit_code`].

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::collaborators::{BotClient, CollaboratorError, ConnectionStore};
use crate::error::{ShutdownError, ShutdownResult};
use crate::request::{Prerequisite, ShutdownRequest};
use crate::terminate::{EXIT_CODE, ProcessTerminator, SystemTerminator};

/// Default bound on the prerequisite wait.
pub const DEFAULT_PREREQUISITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Shutdown configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long to wait for the prerequisite before giving up on it.
    pub prerequisite_timeout: Duration,
    /// Exit status. Must be non-zero so the service manager restarts us.
    pub exit_code: i32,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            prerequisite_timeout: DEFAULT_PREREQUISITE_TIMEOUT,
            exit_code: EXIT_CODE,
        }
    }
}

impl ShutdownConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is zero or the exit code is zero.
    pub fn validate(&self) -> ShutdownResult<()> {
        if self.prerequisite_timeout.is_zero() {
            return Err(ShutdownError::invalid_configuration(
                "prerequisite_timeout must be greater than 0",
            ));
        }
        if self.exit_code == 0 {
            return Err(ShutdownError::invalid_configuration(
                "exit_code must be non-zero",
            ));
        }
        Ok(())
    }
}

/// What [`ShutdownCoordinator::initiate`] did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Teardown was spawned on the current runtime.
    Scheduled,
    /// An earlier request is already being handled. Nothing was done.
    AlreadyInitiated,
    /// No runtime was running, so the process was terminated directly.
    Immediate,
}

/// Runs the teardown sequence at most once per process.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: ShutdownConfig,
    bot: Option<Arc<dyn BotClient>>,
    store: Arc<dyn ConnectionStore>,
    terminator: Arc<dyn ProcessTerminator>,
    initiated: AtomicBool,
}

impl ShutdownCoordinator {
    /// Start building a coordinator around the storage collaborator.
    #[must_use]
    pub fn builder(store: Arc<dyn ConnectionStore>) -> ShutdownCoordinatorBuilder {
        ShutdownCoordinatorBuilder {
            config: ShutdownConfig::default(),
            bot: None,
            store,
            terminator: Arc::new(SystemTerminator),
        }
    }

    /// Whether a shutdown has been accepted.
    #[must_use]
    pub fn is_initiated(&self) -> bool {
        self.inner.initiated.load(Ordering::SeqCst)
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &ShutdownConfig {
        &self.inner.config
    }

    /// Request termination of the process.
    ///
    /// Outside a tokio runtime the process exits on the spot. Inside one,
    /// the first request spawns the teardown and returns immediately; later
    /// requests are logged and dropped.
    pub fn initiate(&self, request: ShutdownRequest) -> ShutdownOutcome {
        let Ok(handle) = Handle::try_current() else {
            self.inner.initiated.store(true, Ordering::SeqCst);
            error!(
                critical = true,
                reason = request.reason(),
                "No running event loop, exiting immediately"
            );
            self.inner.terminator.exit(self.inner.config.exit_code);
            return ShutdownOutcome::Immediate;
        };

        if self.inner.initiated.swap(true, Ordering::SeqCst) {
            info!(
                reason = request.reason(),
                "Shutdown already in progress, ignoring request"
            );
            return ShutdownOutcome::AlreadyInitiated;
        }

        let inner = Arc::clone(&self.inner);
        handle.spawn(async move { inner.teardown(request).await });
        ShutdownOutcome::Scheduled
    }
}

impl fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("config", &self.inner.config)
            .field("has_bot", &self.inner.bot.is_some())
            .field("terminator", &self.inner.terminator)
            .field("initiated", &self.is_initiated())
            .finish()
    }
}

impl CoordinatorInner {
    async fn teardown(&self, request: ShutdownRequest) {
        let (reason, prerequisite) = request.into_parts();
        error!(critical = true, reason = %reason, "Shutting down");

        if let Some(prerequisite) = prerequisite {
            if let Err(e) = self.await_prerequisite(prerequisite).await {
                match &e {
                    ShutdownError::PrerequisiteTimeout(_) => {
                        error!(critical = true, error = %e, "Continuing shutdown without prerequisite");
                    }
                    _ => warn!(error = %e, "Continuing shutdown after prerequisite failure"),
                }
            }
        }

        let failures = self.close_collaborators().await;
        for failure in &failures {
            error!(critical = true, error = %failure, "Teardown failed");
        }
        if failures.iter().any(ShutdownError::is_teardown_failure) {
            if let Err(e) = self.terminator.signal_self_terminate() {
                error!(critical = true, error = %e, "Last-resort SIGTERM failed");
            }
        }

        self.terminator.exit(self.config.exit_code);
    }

    /// Wait for the prerequisite without cancelling it on timeout.
    async fn await_prerequisite(&self, prerequisite: Prerequisite) -> ShutdownResult<()> {
        let task = tokio::spawn(prerequisite);
        match tokio::time::timeout(self.config.prerequisite_timeout, task).await {
            Err(_) => Err(ShutdownError::PrerequisiteTimeout(
                self.config.prerequisite_timeout,
            )),
            Ok(Err(join)) => Err(ShutdownError::Prerequisite(Box::new(join))),
            Ok(Ok(Err(e))) => Err(ShutdownError::Prerequisite(e)),
            Ok(Ok(Ok(()))) => {
                debug!("Shutdown prerequisite finished");
                Ok(())
            }
        }
    }

    /// Disconnect the client, then close storage regardless of the outcome.
    ///
    /// A panicking collaborator counts as a failed step.
    async fn close_collaborators(&self) -> Vec<ShutdownError> {
        let mut failures = Vec::new();

        if let Some(bot) = &self.bot {
            let disconnect = async {
                if !bot.is_connected() {
                    return Ok(false);
                }
                bot.disconnect().await.map(|()| true)
            };
            match guarded(disconnect).await {
                Ok(true) => debug!("Bot client disconnected"),
                Ok(false) => debug!("Bot client not connected, skipping disconnect"),
                Err(e) => failures.push(ShutdownError::disconnect(e)),
            }
        }

        match guarded(self.store.close_all_connections()).await {
            Ok(()) => debug!("Storage connections closed"),
            Err(e) => failures.push(ShutdownError::storage_close(e)),
        }

        failures
    }
}

/// Run a collaborator call, turning a panic into an error.
async fn guarded<T, F>(call: F) -> Result<T, CollaboratorError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(format!("panicked: {}", panic_message(&*payload)).into()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic payload"
    }
}

/// Builder for [`ShutdownCoordinator`].
pub struct ShutdownCoordinatorBuilder {
    config: ShutdownConfig,
    bot: Option<Arc<dyn BotClient>>,
    store: Arc<dyn ConnectionStore>,
    terminator: Arc<dyn ProcessTerminator>,
}

impl ShutdownCoordinatorBuilder {
    /// Use `config` instead of the defaults.
    #[must_use]
    pub fn config(mut self, config: ShutdownConfig) -> Self {
        self.config = config;
        self
    }

    /// Disconnect `bot` during teardown.
    #[must_use]
    pub fn bot(mut self, bot: Arc<dyn BotClient>) -> Self {
        self.bot = Some(bot);
        self
    }

    /// Replace the process terminator.
    #[must_use]
    pub fn terminator(mut self, terminator: Arc<dyn ProcessTerminator>) -> Self {
        self.terminator = terminator;
        self
    }

    /// Build the coordinator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> ShutdownResult<ShutdownCoordinator> {
        self.config.validate()?;
        Ok(ShutdownCoordinator {
            inner: Arc::new(CoordinatorInner {
                config: self.config,
                bot: self.bot,
                store: self.store,
                terminator: self.terminator,
                initiated: AtomicBool::new(false),
            }),
        })
    }
}

impl fmt::Debug for ShutdownCoordinatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownCoordinatorBuilder")
            .field("config", &self.config)
            .field("has_bot", &self.bot.is_some())
            .field("terminator", &self.terminator)
            .finish()
    }
}
