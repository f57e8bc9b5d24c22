//! Prelude module for convenient imports

pub use crate::TestResult;
pub use crate::mock::{BotCall, MockBot, MockStore, RecordingTerminator};
pub use crate::wait::{wait_for_exit, wait_until};
