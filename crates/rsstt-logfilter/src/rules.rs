//! Ordered classification tables.
//!
//! A [`RuleTable`] is a list of `(matcher, decision)` pairs evaluated in
//! insertion order; the first matching rule decides. Records that match no
//! rule get the table's fallback decision.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{LogEvent, LogLevel};

/// Outcome of classifying one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Hide the record.
    Suppress,
    /// Show the record unchanged.
    Pass,
    /// Hide the record and report a successful job run.
    Heartbeat,
    /// Show the record and report a job conflict.
    Failure,
}

impl Decision {
    /// Whether the record stays visible in the log output.
    #[must_use]
    pub fn is_visible(self) -> bool {
        matches!(self, Self::Pass | Self::Failure)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Suppress => write!(f, "suppress"),
            Decision::Pass => write!(f, "pass"),
            Decision::Heartbeat => write!(f, "heartbeat"),
            Decision::Failure => write!(f, "failure"),
        }
    }
}

/// Predicate over a formatted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// The message contains the substring.
    Contains(String),
    /// The level is at most `max_level` and the message lacks `marker`.
    QuietWithout {
        /// Highest level considered quiet.
        max_level: LogLevel,
        /// Substring that keeps a quiet record visible.
        marker: String,
    },
}

impl Matcher {
    /// Evaluate the predicate.
    #[must_use]
    pub fn matches(&self, event: &LogEvent) -> bool {
        match self {
            Matcher::Contains(needle) => event.message.contains(needle.as_str()),
            Matcher::QuietWithout { max_level, marker } => {
                event.level <= *max_level && !event.message.contains(marker.as_str())
            }
        }
    }
}

/// One row of a classification table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRule {
    /// Short name used in diagnostics.
    pub name: &'static str,
    /// Predicate selecting the records this rule applies to.
    pub matcher: Matcher,
    /// Decision for matching records.
    pub decision: Decision,
}

impl ClassificationRule {
    /// Create a new rule.
    #[must_use]
    pub fn new(name: &'static str, matcher: Matcher, decision: Decision) -> Self {
        Self {
            name,
            matcher,
            decision,
        }
    }
}

/// First-match-wins list of classification rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<ClassificationRule>,
    fallback: Decision,
}

impl RuleTable {
    /// Create an empty table that answers `fallback` for every record.
    #[must_use]
    pub fn new(fallback: Decision) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    /// Append a rule; it is evaluated after every rule added before it.
    #[must_use]
    pub fn with_rule(mut self, rule: ClassificationRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Classify a record.
    #[must_use]
    pub fn classify(&self, event: &LogEvent) -> Decision {
        self.matching_rule(event)
            .map_or(self.fallback, |rule| rule.decision)
    }

    /// The first rule matching the record, if any.
    #[must_use]
    pub fn matching_rule(&self, event: &LogEvent) -> Option<&ClassificationRule> {
        self.rules.iter().find(|rule| rule.matcher.matches(event))
    }
}
