//! Tests for full watchdog lifecycle scenarios on the tokio clock.

use rsstt_watchdog::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn recording_handler() -> (ExpiryHandler, Arc<Mutex<Vec<Duration>>>) {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fired);
    (Arc::new(move |delay| sink.lock().push(delay)), fired)
}

#[tokio::test(start_paused = true)]
async fn test_silence_expires_after_default_delay() -> TestResult {
    let (handler, fired) = recording_handler();
    let config = WatchdogConfig::default();
    let watchdog = WatchdogTimer::new(Arc::new(TokioTimer::current()?), handler);

    watchdog.arm(config.initial_delay)?;

    tokio::time::sleep(Duration::from_secs(299)).await;
    assert!(fired.lock().is_empty());
    assert_eq!(watchdog.phase(), WatchdogPhase::Armed);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(*fired.lock(), vec![Duration::from_secs(300)]);
    assert_eq!(watchdog.phase(), WatchdogPhase::Expired);
    assert!(expiry_message(Duration::from_secs(300)).contains("300"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_heartbeats_keep_watchdog_alive() -> TestResult {
    let (handler, fired) = recording_handler();
    let config = WatchdogConfig::default();
    let watchdog = WatchdogTimer::new(Arc::new(TokioTimer::current()?), handler);

    watchdog.arm(config.initial_delay)?;
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_secs(240)).await;
        watchdog.reset(config.all_clear_delay)?;
        assert_eq!(watchdog.delay(), Some(config.all_clear_delay));
    }
    assert!(fired.lock().is_empty());
    assert_eq!(watchdog.reset_count(), 10);

    tokio::time::sleep(config.all_clear_delay + Duration::from_secs(1)).await;
    assert_eq!(*fired.lock(), vec![config.all_clear_delay]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_reset_after_expiry_is_rejected() -> TestResult {
    let (handler, fired) = recording_handler();
    let watchdog = WatchdogTimer::new(Arc::new(TokioTimer::current()?), handler);

    watchdog.arm(Duration::from_secs(1))?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    let result = watchdog.reset(Duration::from_secs(900));
    assert!(matches!(result, Err(WatchdogError::AlreadyExpired(_))));

    tokio::time::sleep(Duration::from_secs(1000)).await;
    assert_eq!(fired.lock().len(), 1);
    Ok(())
}

#[test]
fn test_manual_timer_scenario_matches_tokio() -> TestResult {
    let (handler, fired) = recording_handler();
    let timer = ManualTimer::new();
    let watchdog = WatchdogTimer::new(Arc::new(timer.clone()), handler);

    watchdog.arm(Duration::from_secs(300))?;
    timer.advance(Duration::from_secs(301));

    assert_eq!(*fired.lock(), vec![Duration::from_secs(300)]);
    Ok(())
}
