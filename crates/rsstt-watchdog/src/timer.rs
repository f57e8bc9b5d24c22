//! Timer backends for the watchdog.
//!
//! The watchdog never talks to a clock directly. It asks a [`TimerDriver`]
//! to run a callback after a delay and keeps the returned [`TimerHandle`] so
//! the callback can be cancelled on reset.
//!
//! - [`TokioTimer`] spawns a sleeping task on a tokio runtime.
//! - [`ManualTimer`] is a deterministic clock that only moves when
//!   [`ManualTimer::advance`] is called.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::{WatchdogError, WatchdogResult};

/// Callback invoked when a scheduled delay elapses.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a pending timer callback.
pub trait TimerHandle: Send + Sync + fmt::Debug {
    /// Cancel the callback. Cancelling an already fired or cancelled
    /// callback is a no-op.
    fn cancel(&self);
}

/// Something that can run a callback after a delay.
pub trait TimerDriver: Send + Sync {
    /// Schedule `callback` to run once after `delay`.
    fn call_later(&self, delay: Duration, callback: TimerCallback) -> Box<dyn TimerHandle>;
}

/// Timer backed by `tokio::time::sleep` on a runtime handle.
#[derive(Debug, Clone)]
pub struct TokioTimer {
    handle: Handle,
}

impl TokioTimer {
    /// Create a timer that spawns onto the given runtime.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Create a timer bound to the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::NoRuntime`] when called outside a tokio runtime.
    pub fn current() -> WatchdogResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| WatchdogError::no_runtime(e.to_string()))
    }
}

impl TimerDriver for TokioTimer {
    fn call_later(&self, delay: Duration, callback: TimerCallback) -> Box<dyn TimerHandle> {
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        Box::new(TokioTimerHandle { task })
    }
}

#[derive(Debug)]
struct TokioTimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle for TokioTimerHandle {
    fn cancel(&self) {
        self.task.abort();
    }
}

/// Deterministic timer driven by explicit calls to [`ManualTimer::advance`].
///
/// Callbacks run on the caller's thread, in due order, with no lock held,
/// so a callback may schedule or cancel further callbacks.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    shared: Arc<Mutex<ManualState>>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    pending: Vec<PendingCallback>,
}

struct PendingCallback {
    id: u64,
    due: Duration,
    callback: TimerCallback,
}

impl fmt::Debug for ManualState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualState")
            .field("now", &self.now)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl ManualTimer {
    /// Create a timer whose clock starts at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the manual clock.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.shared.lock().now
    }

    /// Number of callbacks waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.lock().pending.len()
    }

    /// Move the clock forward and run every callback that became due.
    ///
    /// Returns the number of callbacks that ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        let mut fired: usize = 0;

        loop {
            let next = {
                let mut state = self.shared.lock();
                let due_index = state
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| entry.due <= target)
                    .min_by_key(|(_, entry)| (entry.due, entry.id))
                    .map(|(index, _)| index);

                match due_index {
                    Some(index) => {
                        let entry = state.pending.swap_remove(index);
                        state.now = state.now.max(entry.due);
                        Some(entry.callback)
                    }
                    None => {
                        state.now = target;
                        None
                    }
                }
            };

            match next {
                Some(callback) => {
                    callback();
                    fired = fired.saturating_add(1);
                }
                None => break,
            }
        }

        fired
    }
}

impl TimerDriver for ManualTimer {
    fn call_later(&self, delay: Duration, callback: TimerCallback) -> Box<dyn TimerHandle> {
        let mut state = self.shared.lock();
        let id = state.next_id;
        state.next_id = state.next_id.wrapping_add(1);
        let due = state.now.saturating_add(delay);
        state.pending.push(PendingCallback { id, due, callback });

        Box::new(ManualTimerHandle {
            id,
            shared: Arc::downgrade(&self.shared),
        })
    }
}

#[derive(Debug)]
struct ManualTimerHandle {
    id: u64,
    shared: Weak<Mutex<ManualState>>,
}

impl TimerHandle for ManualTimerHandle {
    fn cancel(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.lock().pending.retain(|entry| entry.id != self.id);
        }
    }
}
