//! End-to-end tests running the filters inside a real `tracing` subscriber.

use std::sync::Arc;

use parking_lot::Mutex;
use rsstt_logfilter::prelude::*;
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::FilterExt;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

const CONFLICT: &str =
    "Execution of job \"monitor\" skipped: maximum number of running instances reached (1)";

/// Layer that records the message of every event it is allowed to see.
struct Capture {
    seen: Arc<Mutex<Vec<LogEvent>>>,
}

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.seen.lock().push(format_event(event));
    }
}

#[derive(Default)]
struct RecordingSink {
    heartbeats: Mutex<usize>,
    failures: Mutex<Vec<String>>,
}

impl SignalSink for RecordingSink {
    fn on_heartbeat(&self, _event: &LogEvent) {
        *self.heartbeats.lock() += 1;
    }

    fn on_failure(&self, event: &LogEvent) {
        self.failures.lock().push(event.message.clone());
    }
}

fn capture_with(
    config: FilterConfig,
    sink: Arc<RecordingSink>,
) -> (impl Subscriber + Send + Sync, Arc<Mutex<Vec<LogEvent>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let scheduler = ClassifyingFilter::new(SourceFilter::scheduler(&config)).with_sink(sink);
    let access = ClassifyingFilter::new(SourceFilter::access_log(&config));
    let subscriber = tracing_subscriber::registry().with(
        Capture {
            seen: Arc::clone(&seen),
        }
        .with_filter(scheduler.and(access)),
    );
    (subscriber, seen)
}

fn messages(seen: &Mutex<Vec<LogEvent>>) -> Vec<String> {
    seen.lock().iter().map(|e| e.message.clone()).collect()
}

#[test]
fn test_scheduler_records_are_classified() {
    let sink = Arc::new(RecordingSink::default());
    let (subscriber, seen) = capture_with(FilterConfig::default(), Arc::clone(&sink));

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(target: "scheduler", "Running job \"monitor\" (scheduled at 12:00:00)");
        tracing::warn!(target: "scheduler", "{}", CONFLICT);
        tracing::info!(target: "scheduler", job = "monitor", "Job executed successfully");
        tracing::info!(target: "scheduler", "Scheduler started");
    });

    assert_eq!(messages(&seen), vec![CONFLICT.to_string(), "Scheduler started".to_string()]);
    assert_eq!(*sink.failures.lock(), vec![CONFLICT.to_string()]);
    assert_eq!(*sink.heartbeats.lock(), 1);
}

#[test]
fn test_conflicts_stay_visible_at_any_count() {
    let sink = Arc::new(RecordingSink::default());
    let (subscriber, seen) = capture_with(FilterConfig::default(), Arc::clone(&sink));

    tracing::subscriber::with_default(subscriber, || {
        for _ in 0..20 {
            tracing::warn!(target: "scheduler::executor", "{}", CONFLICT);
        }
    });

    assert_eq!(seen.lock().len(), 20);
    assert_eq!(sink.failures.lock().len(), 20);
}

#[test]
fn test_access_log_marker() {
    let sink = Arc::new(RecordingSink::default());
    let (subscriber, seen) = capture_with(FilterConfig::default(), sink);

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(target: "http::access", "127.0.0.1 \"GET / HTTP/1.1\" 200 \"Mozilla/5.0\"");
        tracing::info!(target: "http::access", "127.0.0.1 \"GET / HTTP/1.1\" 200 \"curl/8.4\"");
        tracing::warn!(target: "http::access", "127.0.0.1 \"GET /x HTTP/1.1\" 404 \"curl/8.4\"");
    });

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().any(|e| e.message.contains("Mozilla")));
    assert!(seen.iter().any(|e| e.level == LogLevel::Warning));
}

#[test]
fn test_unrelated_targets_pass_untouched() {
    let sink = Arc::new(RecordingSink::default());
    let (subscriber, seen) = capture_with(FilterConfig::default(), Arc::clone(&sink));

    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!(target: "feed::fetch", "Running job executed successfully");
        tracing::error!(target: "storage", critical = true, "Database is gone");
    });

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen.last().map(|e| e.level), Some(LogLevel::Critical));
    assert_eq!(*sink.heartbeats.lock(), 0);
}

#[test]
fn test_custom_targets_and_marker() {
    let config = FilterConfig {
        scheduler_targets: vec!["jobs".to_string()],
        access_log_targets: vec!["web".to_string()],
        browser_marker: "Firefox".to_string(),
        ..Default::default()
    };
    let sink = Arc::new(RecordingSink::default());
    let (subscriber, seen) = capture_with(config, Arc::clone(&sink));

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(target: "web", "GET / Mozilla/5.0");
        tracing::info!(target: "web", "GET / Firefox/130.0");
        tracing::info!(target: "jobs", "Job \"monitor\" executed successfully");
    });

    assert_eq!(messages(&seen), vec!["GET / Firefox/130.0".to_string()]);
    assert_eq!(*sink.heartbeats.lock(), 1);
}
