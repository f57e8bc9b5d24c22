//! `tracing` integration.
//!
//! [`ClassifyingFilter`] is a per-layer [`Filter`] that formats each event
//! from its source targets into a [`LogEvent`], classifies it, forwards
//! health signals to a [`SignalSink`] and hides suppressed records from the
//! layer it wraps. Events from other targets pass untouched.

use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Filter};

use crate::event::{LogEvent, LogLevel};
use crate::filters::SourceFilter;
use crate::rules::Decision;

/// Receiver of health signals extracted from the log stream.
///
/// Called synchronously from inside the subscriber while it dispatches the
/// event. Events emitted from here are delivered inline by the global
/// dispatcher but dropped by a scoped one (`set_default`), so anything that
/// must be logged should also be logged from spawned work.
pub trait SignalSink: Send + Sync {
    /// A job run completed.
    fn on_heartbeat(&self, event: &LogEvent);

    /// A job run conflicted with a still-running instance.
    fn on_failure(&self, event: &LogEvent);
}

/// Per-layer filter that classifies events and reports health signals.
#[derive(Clone)]
pub struct ClassifyingFilter {
    filter: Arc<SourceFilter>,
    sink: Option<Arc<dyn SignalSink>>,
}

impl ClassifyingFilter {
    /// Wrap a source filter without a signal sink.
    #[must_use]
    pub fn new(filter: SourceFilter) -> Self {
        Self {
            filter: Arc::new(filter),
            sink: None,
        }
    }

    /// Report heartbeat and failure decisions to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn SignalSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The wrapped source filter.
    #[must_use]
    pub fn source(&self) -> &SourceFilter {
        &self.filter
    }

    /// Classify a record and forward any health signal.
    pub fn process(&self, event: &LogEvent) -> Decision {
        let decision = self.filter.classify(event);
        if let Some(sink) = &self.sink {
            match decision {
                Decision::Heartbeat => sink.on_heartbeat(event),
                Decision::Failure => sink.on_failure(event),
                Decision::Suppress | Decision::Pass => {}
            }
        }
        decision
    }
}

impl fmt::Debug for ClassifyingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifyingFilter")
            .field("filter", &self.filter.name())
            .field("targets", &self.filter.targets())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl<S: Subscriber> Filter<S> for ClassifyingFilter {
    fn enabled(&self, _meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        true
    }

    fn event_enabled(&self, event: &Event<'_>, _cx: &Context<'_, S>) -> bool {
        if !self.filter.covers(event.metadata().target()) {
            return true;
        }
        self.process(&format_event(event)).is_visible()
    }
}

/// Format a `tracing` event the way the classifier sees it.
///
/// The `message` field comes first, followed by the remaining fields as
/// `name=value` pairs. The `critical` flag raises an error to
/// [`LogLevel::Critical`] and is not rendered.
#[must_use]
pub fn format_event(event: &Event<'_>) -> LogEvent {
    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);
    let metadata = event.metadata();
    LogEvent::new(
        metadata.target(),
        LogLevel::from_tracing(*metadata.level(), visitor.critical),
        visitor.finish(),
    )
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
    critical: bool,
}

impl MessageVisitor {
    fn push_field(&mut self, name: &str, value: &str) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        self.fields.push_str(name);
        self.fields.push('=');
        self.fields.push_str(value);
    }

    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }
}

impl Visit for MessageVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "critical" {
            self.critical = value;
        } else {
            self.push_field(field.name(), if value { "true" } else { "false" });
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message.push_str(&rendered);
        } else {
            self.push_field(field.name(), &rendered);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterConfig;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        heartbeats: Mutex<Vec<String>>,
        failures: Mutex<Vec<String>>,
    }

    impl SignalSink for RecordingSink {
        fn on_heartbeat(&self, event: &LogEvent) {
            if let Ok(mut guard) = self.heartbeats.lock() {
                guard.push(event.message.clone());
            }
        }

        fn on_failure(&self, event: &LogEvent) {
            if let Ok(mut guard) = self.failures.lock() {
                guard.push(event.message.clone());
            }
        }
    }

    #[test]
    fn test_process_forwards_signals() {
        let sink = Arc::new(RecordingSink::default());
        let filter = ClassifyingFilter::new(SourceFilter::scheduler(&FilterConfig::default()))
            .with_sink(sink.clone());

        let conflict = LogEvent::new(
            "scheduler",
            LogLevel::Warning,
            "Execution of job \"monitor\" skipped: maximum number of running instances reached (1)",
        );
        let success = LogEvent::new("scheduler", LogLevel::Info, "Job \"monitor\" executed successfully");
        let start = LogEvent::new("scheduler", LogLevel::Info, "Running job \"monitor\"");

        assert_eq!(filter.process(&conflict), Decision::Failure);
        assert_eq!(filter.process(&success), Decision::Heartbeat);
        assert_eq!(filter.process(&start), Decision::Suppress);

        assert_eq!(sink.failures.lock().map(|g| g.len()).unwrap_or(0), 1);
        assert_eq!(sink.heartbeats.lock().map(|g| g.len()).unwrap_or(0), 1);
    }

    #[test]
    fn test_process_without_sink() {
        let filter = ClassifyingFilter::new(SourceFilter::access_log(&FilterConfig::default()));
        let event = LogEvent::new("http::access", LogLevel::Info, "GET / \"Mozilla/5.0\"");
        assert_eq!(filter.process(&event), Decision::Pass);
    }
}
