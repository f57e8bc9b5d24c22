//! Prelude module for convenient imports

pub use crate::error::{FilterError, FilterResult};
pub use crate::event::{LogEvent, LogLevel};
pub use crate::filters::{
    ANNOUNCEMENT_PATTERN, CONFLICT_PATTERN, DEFAULT_BROWSER_MARKER, FilterConfig, SUCCESS_PATTERN,
    SourceFilter,
};
pub use crate::layer::{ClassifyingFilter, SignalSink, format_event};
pub use crate::rules::{ClassificationRule, Decision, Matcher, RuleTable};
