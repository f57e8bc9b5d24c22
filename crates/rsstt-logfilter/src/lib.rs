//! Log-stream classification for the RSStT background service.
//!
//! The job scheduler and the HTTP server only talk through their logs. This
//! crate reads those logs and turns selected records into health signals:
//!
//! - **Scheduler filter**: overlapping-run conflicts become visible
//!   [`Decision::Failure`]s, successful runs become hidden
//!   [`Decision::Heartbeat`]s, start announcements are hidden.
//! - **Access-log filter**: info-level records from non-browser clients are
//!   hidden; everything else passes.
//!
//! Classification ([`rules`], [`filters`]) is independent of any logging
//! framework. [`layer`] adapts it to `tracing_subscriber` as a per-layer
//! filter.
//!
//! # Example
//!
//! ```rust
//! use rsstt_logfilter::prelude::*;
//!
//! let filter = SourceFilter::access_log(&FilterConfig::default());
//! let probe = LogEvent::new("http::access", LogLevel::Info, "GET /healthz curl/8.4");
//! assert_eq!(filter.classify(&probe), Decision::Suppress);
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod event;
pub mod filters;
pub mod layer;
pub mod prelude;
pub mod rules;

pub use error::{FilterError, FilterResult};
pub use event::{LogEvent, LogLevel};
pub use filters::{FilterConfig, SourceFilter};
pub use layer::{ClassifyingFilter, SignalSink, format_event};
pub use rules::{ClassificationRule, Decision, Matcher, RuleTable};
