//! Integration tests for the teardown sequence.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use rsstt_shutdown::prelude::*;
use rsstt_test_helpers::prelude::*;
use tokio::time::Instant;
use tracing_test::traced_test;

const EXIT_WAIT: Duration = Duration::from_secs(60);

struct Harness {
    bot: Arc<MockBot>,
    store: Arc<MockStore>,
    terminator: Arc<RecordingTerminator>,
    coordinator: ShutdownCoordinator,
}

fn harness(bot: MockBot, store: MockStore) -> Result<Harness, ShutdownError> {
    let bot = Arc::new(bot);
    let store = Arc::new(store);
    let terminator = Arc::new(RecordingTerminator::new());
    let coordinator = ShutdownCoordinator::builder(store.clone())
        .bot(bot.clone())
        .terminator(terminator.clone())
        .build()?;
    Ok(Harness {
        bot,
        store,
        terminator,
        coordinator,
    })
}

fn notify(bot: &Arc<MockBot>, text: &str) -> Prerequisite {
    let bot = Arc::clone(bot);
    let text = text.to_string();
    async move { bot.send_message("manager", &text).await }.boxed()
}

#[tokio::test(start_paused = true)]
async fn test_teardown_disconnects_closes_and_exits() -> TestResult {
    let h = harness(MockBot::new(), MockStore::new())?;

    let outcome = h.coordinator.initiate(ShutdownRequest::new("test"));
    assert_eq!(outcome, ShutdownOutcome::Scheduled);
    assert!(h.coordinator.is_initiated());

    assert_eq!(wait_for_exit(&h.terminator, EXIT_WAIT).await, Some(1));
    assert_eq!(h.bot.calls(), vec![BotCall::Disconnect]);
    assert_eq!(h.store.close_count(), 1);
    assert_eq!(h.terminator.signal_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_initiate_is_idempotent() -> TestResult {
    let h = harness(MockBot::new(), MockStore::new())?;

    assert_eq!(
        h.coordinator.initiate(ShutdownRequest::new("first")),
        ShutdownOutcome::Scheduled
    );
    assert_eq!(
        h.coordinator.clone().initiate(ShutdownRequest::new("second")),
        ShutdownOutcome::AlreadyInitiated
    );

    assert_eq!(wait_for_exit(&h.terminator, EXIT_WAIT).await, Some(1));
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(h.terminator.exits(), vec![1]);
    assert_eq!(h.bot.disconnect_count(), 1);
    assert_eq!(h.store.close_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_failure_still_closes_storage() -> TestResult {
    let h = harness(MockBot::with_failing_disconnect(), MockStore::new())?;

    h.coordinator.initiate(ShutdownRequest::new("test"));

    assert_eq!(wait_for_exit(&h.terminator, EXIT_WAIT).await, Some(1));
    assert_eq!(h.bot.disconnect_count(), 1);
    assert_eq!(h.store.close_count(), 1);
    assert_eq!(h.terminator.signal_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_storage_failure_sends_last_resort_signal() -> TestResult {
    let h = harness(MockBot::new(), MockStore::failing())?;

    h.coordinator.initiate(ShutdownRequest::new("test"));

    assert_eq!(wait_for_exit(&h.terminator, EXIT_WAIT).await, Some(1));
    assert_eq!(h.terminator.signal_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_panicking_disconnect_still_closes_storage_and_exits() -> TestResult {
    let h = harness(MockBot::with_panicking_disconnect(), MockStore::new())?;

    h.coordinator.initiate(ShutdownRequest::new("test"));

    assert_eq!(wait_for_exit(&h.terminator, EXIT_WAIT).await, Some(1));
    assert_eq!(h.bot.disconnect_count(), 1);
    assert_eq!(h.store.close_count(), 1);
    assert_eq!(h.terminator.signal_count(), 1);
    assert_eq!(
        h.coordinator.initiate(ShutdownRequest::new("again")),
        ShutdownOutcome::AlreadyInitiated
    );
    assert_eq!(h.terminator.exits(), vec![1]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_panicking_storage_close_still_exits() -> TestResult {
    let h = harness(MockBot::new(), MockStore::panicking())?;

    h.coordinator.initiate(ShutdownRequest::new("test"));

    assert_eq!(wait_for_exit(&h.terminator, EXIT_WAIT).await, Some(1));
    assert_eq!(h.bot.disconnect_count(), 1);
    assert_eq!(h.store.close_count(), 1);
    assert_eq!(h.terminator.signal_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_disconnected_bot_is_left_alone() -> TestResult {
    let h = harness(MockBot::disconnected(), MockStore::new())?;

    h.coordinator.initiate(ShutdownRequest::new("test"));

    assert_eq!(wait_for_exit(&h.terminator, EXIT_WAIT).await, Some(1));
    assert!(h.bot.calls().is_empty());
    assert_eq!(h.store.close_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_without_bot_client() -> TestResult {
    let store = Arc::new(MockStore::new());
    let terminator = Arc::new(RecordingTerminator::new());
    let coordinator = ShutdownCoordinator::builder(store.clone())
        .terminator(terminator.clone())
        .build()?;

    coordinator.initiate(ShutdownRequest::new("test"));

    assert_eq!(wait_for_exit(&terminator, EXIT_WAIT).await, Some(1));
    assert_eq!(store.close_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_prerequisite_completes_before_disconnect() -> TestResult {
    let h = harness(MockBot::new(), MockStore::new())?;
    let request = ShutdownRequest::new("test").with_prerequisite(notify(&h.bot, "bye"));

    h.coordinator.initiate(request);

    assert_eq!(wait_for_exit(&h.terminator, EXIT_WAIT).await, Some(1));
    assert_eq!(
        h.bot.calls(),
        vec![
            BotCall::Send {
                destination: "manager".to_string(),
                text: "bye".to_string(),
            },
            BotCall::Disconnect,
        ]
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_prerequisite_timeout_is_bounded() -> TestResult {
    let h = harness(
        MockBot::with_send_delay(Duration::from_secs(60)),
        MockStore::new(),
    )?;
    let request = ShutdownRequest::new("test").with_prerequisite(notify(&h.bot, "slow"));
    let start = Instant::now();

    h.coordinator.initiate(request);

    assert_eq!(wait_for_exit(&h.terminator, EXIT_WAIT).await, Some(1));
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(10), "exited after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(60), "exited after {elapsed:?}");
    assert!(h.bot.sent_texts().is_empty());
    assert_eq!(h.store.close_count(), 1);
    assert_eq!(h.terminator.signal_count(), 0);

    // The timeout stops the wait, not the prerequisite.
    let delivered = wait_until(Duration::from_secs(120), || !h.bot.sent_texts().is_empty()).await;
    assert!(delivered);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_custom_prerequisite_timeout() -> TestResult {
    let bot = Arc::new(MockBot::with_send_delay(Duration::from_secs(5)));
    let store = Arc::new(MockStore::new());
    let terminator = Arc::new(RecordingTerminator::new());
    let coordinator = ShutdownCoordinator::builder(store)
        .bot(bot.clone())
        .terminator(terminator.clone())
        .config(ShutdownConfig {
            prerequisite_timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .build()?;
    let start = Instant::now();

    coordinator.initiate(ShutdownRequest::new("test").with_prerequisite(notify(&bot, "x")));

    assert_eq!(wait_for_exit(&terminator, EXIT_WAIT).await, Some(1));
    assert!(start.elapsed() < Duration::from_secs(5));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_failed_prerequisite_does_not_abort() -> TestResult {
    let h = harness(MockBot::with_failing_send(), MockStore::new())?;
    let request = ShutdownRequest::new("test").with_prerequisite(notify(&h.bot, "lost"));

    h.coordinator.initiate(request);

    assert_eq!(wait_for_exit(&h.terminator, EXIT_WAIT).await, Some(1));
    assert_eq!(h.bot.disconnect_count(), 1);
    assert_eq!(h.store.close_count(), 1);
    assert_eq!(h.terminator.signal_count(), 0);
    Ok(())
}

#[test]
fn test_no_runtime_exits_immediately() -> TestResult {
    let h = harness(MockBot::new(), MockStore::new())?;

    let outcome = h.coordinator.initiate(ShutdownRequest::new("outside the event loop"));

    assert_eq!(outcome, ShutdownOutcome::Immediate);
    assert_eq!(h.terminator.exits(), vec![1]);
    assert!(h.bot.calls().is_empty());
    assert_eq!(h.store.close_count(), 0);
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = ShutdownCoordinator::builder(Arc::new(MockStore::new()))
        .config(ShutdownConfig {
            exit_code: 0,
            ..Default::default()
        })
        .build();
    assert!(matches!(result, Err(ShutdownError::InvalidConfiguration(_))));
}

#[test]
fn test_config_from_json() -> TestResult {
    let config: ShutdownConfig =
        serde_json::from_str(r#"{"prerequisite_timeout":{"secs":3,"nanos":0}}"#)?;
    assert_eq!(config.prerequisite_timeout, Duration::from_secs(3));
    assert_eq!(config.exit_code, EXIT_CODE);
    Ok(())
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn test_teardown_is_logged() -> TestResult {
    let h = harness(MockBot::with_failing_disconnect(), MockStore::new())?;

    h.coordinator.initiate(ShutdownRequest::new("watchdog expired"));
    h.coordinator.initiate(ShutdownRequest::new("late request"));
    assert_eq!(wait_for_exit(&h.terminator, EXIT_WAIT).await, Some(1));

    assert!(logs_contain("Shutting down"));
    assert!(logs_contain("watchdog expired"));
    assert!(logs_contain("Shutdown already in progress"));
    assert!(logs_contain("Mock disconnect failure"));
    Ok(())
}
