//! Polling helpers for work that runs on detached tasks.
//!
//! Both helpers sleep on the tokio clock, so under a paused runtime they
//! advance virtual time instead of waiting for real.

use std::time::Duration;

use tokio::time::Instant;

use crate::mock::RecordingTerminator;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Poll `condition` until it holds or `timeout` elapses.
///
/// Returns whether the condition was met.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Wait until `terminator` records an exit and return its code.
pub async fn wait_for_exit(terminator: &RecordingTerminator, timeout: Duration) -> Option<i32> {
    if wait_until(timeout, || terminator.last_exit().is_some()).await {
        terminator.last_exit()
    } else {
        None
    }
}
