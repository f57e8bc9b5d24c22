//! Mock collaborators for testing.
//!
//! Every mock records what was asked of it behind a `parking_lot::Mutex`
//! and is shared through `Arc`, so a test keeps a handle while the code
//! under test owns another.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rsstt_shutdown::{
    BotClient, CollaboratorError, ConnectionStore, ProcessTerminator, ShutdownError,
    ShutdownResult,
};

/// A call made on a [`MockBot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCall {
    /// `send_message` completed.
    Send {
        /// Destination chat.
        destination: String,
        /// Message text.
        text: String,
    },
    /// `disconnect` was called.
    Disconnect,
}

#[derive(Debug)]
struct MockBotState {
    connected: bool,
    calls: Vec<BotCall>,
}

/// Recording [`BotClient`].
#[derive(Debug)]
pub struct MockBot {
    state: Mutex<MockBotState>,
    pub fail_disconnect: bool,
    pub panic_disconnect: bool,
    pub fail_send: bool,
    pub send_delay: Option<Duration>,
}

impl MockBot {
    /// A connected client that succeeds at everything.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockBotState {
                connected: true,
                calls: Vec::new(),
            }),
            fail_disconnect: false,
            panic_disconnect: false,
            fail_send: false,
            send_delay: None,
        }
    }

    /// A client that was never connected.
    pub fn disconnected() -> Self {
        let bot = Self::new();
        bot.state.lock().connected = false;
        bot
    }

    pub fn with_failing_disconnect() -> Self {
        Self {
            fail_disconnect: true,
            ..Self::new()
        }
    }

    /// `disconnect` panics after recording the call.
    pub fn with_panicking_disconnect() -> Self {
        Self {
            panic_disconnect: true,
            ..Self::new()
        }
    }

    pub fn with_failing_send() -> Self {
        Self {
            fail_send: true,
            ..Self::new()
        }
    }

    /// Every `send_message` sleeps for `delay` first.
    pub fn with_send_delay(delay: Duration) -> Self {
        Self {
            send_delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<BotCall> {
        self.state.lock().calls.clone()
    }

    /// Texts of all delivered messages, in delivery order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                BotCall::Send { text, .. } => Some(text.clone()),
                BotCall::Disconnect => None,
            })
            .collect()
    }

    pub fn disconnect_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| **call == BotCall::Disconnect)
            .count()
    }
}

impl Default for MockBot {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BotClient for MockBot {
    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    async fn disconnect(&self) -> Result<(), CollaboratorError> {
        let mut state = self.state.lock();
        state.calls.push(BotCall::Disconnect);
        if self.panic_disconnect {
            drop(state);
            panic!("Mock disconnect panic");
        }
        if self.fail_disconnect {
            return Err("Mock disconnect failure".into());
        }
        state.connected = false;
        Ok(())
    }

    async fn send_message(&self, destination: &str, text: &str) -> Result<(), CollaboratorError> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_send {
            return Err("Mock send failure".into());
        }
        self.state.lock().calls.push(BotCall::Send {
            destination: destination.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

/// Recording [`ConnectionStore`].
#[derive(Debug, Default)]
pub struct MockStore {
    closes: Mutex<usize>,
    pub fail_close: bool,
    pub panic_close: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_close: true,
            ..Self::default()
        }
    }

    /// `close_all_connections` panics after counting the call.
    pub fn panicking() -> Self {
        Self {
            panic_close: true,
            ..Self::default()
        }
    }

    /// Number of `close_all_connections` calls, failed ones included.
    pub fn close_count(&self) -> usize {
        *self.closes.lock()
    }
}

#[async_trait]
impl ConnectionStore for MockStore {
    async fn close_all_connections(&self) -> Result<(), CollaboratorError> {
        *self.closes.lock() += 1;
        if self.panic_close {
            panic!("Mock close panic");
        }
        if self.fail_close {
            return Err("Mock close failure".into());
        }
        Ok(())
    }
}

/// [`ProcessTerminator`] that records instead of ending the process.
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    exits: Mutex<Vec<i32>>,
    signals: Mutex<usize>,
    pub fail_signal: bool,
}

impl RecordingTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit codes requested so far.
    pub fn exits(&self) -> Vec<i32> {
        self.exits.lock().clone()
    }

    pub fn last_exit(&self) -> Option<i32> {
        self.exits.lock().last().copied()
    }

    /// Number of self-termination signals requested.
    pub fn signal_count(&self) -> usize {
        *self.signals.lock()
    }
}

impl ProcessTerminator for RecordingTerminator {
    fn exit(&self, code: i32) {
        self.exits.lock().push(code);
    }

    fn signal_self_terminate(&self) -> ShutdownResult<()> {
        *self.signals.lock() += 1;
        if self.fail_signal {
            return Err(ShutdownError::signal("Mock signal failure"));
        }
        Ok(())
    }
}
