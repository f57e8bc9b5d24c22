//! Global subscriber setup.
//!
//! Installs a registry with an [`EnvFilter`] and a `fmt` layer that carries
//! the supervisor's scheduler and access-log filters. `RUST_LOG` replaces
//! the base level when set; the per-target directives below are always
//! added on top.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::filter::FilterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::SupervisorConfig;
use crate::error::{SupervisorError, SupervisorResult};
use crate::supervisor::Supervisor;

/// Base level when `RUST_LOG` is not set.
#[must_use]
pub fn base_level(config: &SupervisorConfig) -> &'static str {
    if config.debug { "debug" } else { "info" }
}

/// Per-target directives derived from the configuration.
///
/// Muted targets log at `info` in debug mode and `warn` otherwise. Shut-up
/// targets log at `error` in debug mode and not at all otherwise. Scheduler
/// targets are pinned at `info` so heartbeats and conflicts always reach the
/// scheduler filter.
#[must_use]
pub fn directives(config: &SupervisorConfig) -> Vec<String> {
    let (muted, shut_up) = if config.debug {
        ("info", "error")
    } else {
        ("warn", "off")
    };

    let muted = config.muted_targets.iter().map(|t| format!("{t}={muted}"));
    let shut_up = config.shut_up_targets.iter().map(|t| format!("{t}={shut_up}"));
    let scheduler = config
        .filters
        .scheduler_targets
        .iter()
        .map(|t| format!("{t}=info"));
    muted.chain(shut_up).chain(scheduler).collect()
}

/// Build the global [`EnvFilter`].
///
/// # Errors
///
/// Returns an error if a configured target does not form a valid directive.
pub fn build_env_filter(config: &SupervisorConfig) -> SupervisorResult<EnvFilter> {
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(base_level(config)));
    for directive in directives(config) {
        let parsed = directive
            .parse()
            .map_err(|e| SupervisorError::logging(format!("invalid directive `{directive}`: {e}")))?;
        filter = filter.add_directive(parsed);
    }
    Ok(filter)
}

/// Install the global subscriber with the supervisor's filters attached.
///
/// # Errors
///
/// Returns an error if a directive is invalid or a global subscriber is
/// already installed.
pub fn init(config: &SupervisorConfig, supervisor: &Arc<Supervisor>) -> SupervisorResult<()> {
    let env_filter = build_env_filter(config)?;
    let classifying = supervisor
        .scheduler_filter()
        .and(supervisor.access_log_filter());
    let fmt_layer = fmt::layer().with_target(true).with_filter(classifying);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| SupervisorError::logging(e.to_string()))?;

    info!(debug = config.debug, "Logging initialized");
    Ok(())
}
