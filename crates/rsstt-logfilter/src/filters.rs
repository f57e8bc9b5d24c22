//! The two source filters: job scheduler and HTTP access log.

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};
use crate::event::{LogEvent, LogLevel};
use crate::rules::{ClassificationRule, Decision, Matcher, RuleTable};

/// Scheduler message emitted when a run is skipped because the previous one is still going.
pub const CONFLICT_PATTERN: &str = "skipped: maximum number of running instances reached";

/// Scheduler message emitted after a job run completes.
pub const SUCCESS_PATTERN: &str = "executed successfully";

/// Scheduler message emitted when a periodic job starts.
pub const ANNOUNCEMENT_PATTERN: &str = "Running job ";

/// Default access-log marker identifying interactive browsers.
pub const DEFAULT_BROWSER_MARKER: &str = "Mozilla";

/// Sources and patterns for both filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Targets emitted by the job scheduler.
    pub scheduler_targets: Vec<String>,
    /// Targets emitted by the HTTP server access log.
    pub access_log_targets: Vec<String>,
    /// Substring that keeps an info-level access record visible.
    pub browser_marker: String,
    /// Substring marking a skipped, overlapping job run.
    pub conflict_pattern: String,
    /// Substring marking a successful job run.
    pub success_pattern: String,
    /// Substring marking a job start announcement.
    pub announcement_pattern: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            scheduler_targets: vec!["scheduler".to_string()],
            access_log_targets: vec!["http::access".to_string()],
            browser_marker: DEFAULT_BROWSER_MARKER.to_string(),
            conflict_pattern: CONFLICT_PATTERN.to_string(),
            success_pattern: SUCCESS_PATTERN.to_string(),
            announcement_pattern: ANNOUNCEMENT_PATTERN.to_string(),
        }
    }
}

impl FilterConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a filter has no targets or a pattern is empty.
    pub fn validate(&self) -> FilterResult<()> {
        if self.scheduler_targets.is_empty() {
            return Err(FilterError::NoTargets(SourceFilter::SCHEDULER));
        }
        if self.access_log_targets.is_empty() {
            return Err(FilterError::NoTargets(SourceFilter::ACCESS_LOG));
        }
        for (name, pattern) in [
            ("browser_marker", &self.browser_marker),
            ("conflict_pattern", &self.conflict_pattern),
            ("success_pattern", &self.success_pattern),
            ("announcement_pattern", &self.announcement_pattern),
        ] {
            if pattern.is_empty() {
                return Err(FilterError::EmptyPattern(name));
            }
        }
        Ok(())
    }
}

/// A classification table bound to a set of log targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilter {
    name: &'static str,
    targets: Vec<String>,
    table: RuleTable,
}

impl SourceFilter {
    /// Name of the job-scheduler filter.
    pub const SCHEDULER: &'static str = "scheduler";
    /// Name of the access-log filter.
    pub const ACCESS_LOG: &'static str = "access_log";

    /// Build a filter from parts.
    #[must_use]
    pub fn new(name: &'static str, targets: Vec<String>, table: RuleTable) -> Self {
        Self {
            name,
            targets,
            table,
        }
    }

    /// Filter for the recurring job scheduler's execution log.
    ///
    /// Conflicts stay visible and count as failures, successful runs are
    /// hidden heartbeats, start announcements are hidden, the rest passes.
    #[must_use]
    pub fn scheduler(config: &FilterConfig) -> Self {
        let table = RuleTable::new(Decision::Pass)
            .with_rule(ClassificationRule::new(
                "conflict",
                Matcher::Contains(config.conflict_pattern.clone()),
                Decision::Failure,
            ))
            .with_rule(ClassificationRule::new(
                "success",
                Matcher::Contains(config.success_pattern.clone()),
                Decision::Heartbeat,
            ))
            .with_rule(ClassificationRule::new(
                "announcement",
                Matcher::Contains(config.announcement_pattern.clone()),
                Decision::Suppress,
            ));
        Self::new(Self::SCHEDULER, config.scheduler_targets.clone(), table)
    }

    /// Filter for the HTTP server access log.
    ///
    /// Info-and-below records from non-browser clients are hidden; warnings,
    /// errors and browser traffic always pass.
    #[must_use]
    pub fn access_log(config: &FilterConfig) -> Self {
        let table = RuleTable::new(Decision::Pass).with_rule(ClassificationRule::new(
            "automated",
            Matcher::QuietWithout {
                max_level: LogLevel::Info,
                marker: config.browser_marker.clone(),
            },
            Decision::Suppress,
        ));
        Self::new(Self::ACCESS_LOG, config.access_log_targets.clone(), table)
    }

    /// Filter name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Targets this filter listens on.
    #[must_use]
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Whether a target belongs to this filter's sources.
    ///
    /// A target matches a source exactly or as a `::`-separated child of it.
    #[must_use]
    pub fn covers(&self, target: &str) -> bool {
        self.targets.iter().any(|source| {
            target
                .strip_prefix(source.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
        })
    }

    /// Classify a record. Records from other sources always pass.
    #[must_use]
    pub fn classify(&self, event: &LogEvent) -> Decision {
        if self.covers(&event.source) {
            self.table.classify(event)
        } else {
            Decision::Pass
        }
    }
}
