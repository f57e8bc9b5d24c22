//! Operator notifications.
//!
//! Delivery is best effort: a dispatched notification runs on its own task,
//! may arrive out of order with later ones, and only logs a warning when it
//! fails.

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use rsstt_shutdown::{BotClient, Prerequisite};
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// The bot client paired with the operator's chat.
#[derive(Clone)]
pub struct OperatorChannel {
    bot: Arc<dyn BotClient>,
    destination: String,
}

impl OperatorChannel {
    /// Send operator messages to `destination` through `bot`.
    pub fn new(bot: Arc<dyn BotClient>, destination: impl Into<String>) -> Self {
        Self {
            bot,
            destination: destination.into(),
        }
    }

    /// Build the send of `text` without starting it.
    ///
    /// Used as a shutdown prerequisite, so the teardown decides when (and
    /// for how long) it runs.
    pub fn prepare(&self, text: impl Into<String>) -> Prerequisite {
        let bot = Arc::clone(&self.bot);
        let destination = self.destination.clone();
        let text = text.into();
        async move { bot.send_message(&destination, &text).await }.boxed()
    }

    /// Send `text` on a detached task.
    ///
    /// Returns `false` when no runtime is available to run the send.
    pub fn dispatch(&self, text: impl Into<String>) -> bool {
        let Ok(handle) = Handle::try_current() else {
            warn!("No running event loop, dropping operator notification");
            return false;
        };
        let send = self.prepare(text);
        let destination = self.destination.clone();
        handle.spawn(async move {
            match send.await {
                Ok(()) => debug!(destination = %destination, "Operator notified"),
                Err(e) => warn!(
                    destination = %destination,
                    error = %e,
                    "Failed to deliver operator notification"
                ),
            }
        });
        true
    }
}

impl fmt::Debug for OperatorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorChannel")
            .field("destination", &self.destination)
            .field("connected", &self.bot.is_connected())
            .finish()
    }
}
