//! Process termination.

use std::fmt;

use crate::error::ShutdownResult;

/// Exit status used on every shutdown path. The outer service manager
/// restarts the process on a non-zero exit.
pub const EXIT_CODE: i32 = 1;

/// Ends the process.
///
/// Separated from the coordinator so tests can observe termination without
/// losing the test process.
pub trait ProcessTerminator: Send + Sync + fmt::Debug {
    /// Exit with `code`. Production implementations do not return.
    fn exit(&self, code: i32);

    /// Send SIGTERM to the current process.
    ///
    /// # Errors
    ///
    /// Returns an error if the signal could not be delivered.
    fn signal_self_terminate(&self) -> ShutdownResult<()>;
}

/// Terminator acting on the real process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTerminator;

impl ProcessTerminator for SystemTerminator {
    #[expect(clippy::exit, reason = "terminating the process is the purpose of this type")]
    fn exit(&self, code: i32) {
        std::process::exit(code);
    }

    #[cfg(unix)]
    fn signal_self_terminate(&self) -> ShutdownResult<()> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::getpid;

        kill(getpid(), Signal::SIGTERM).map_err(|e| crate::error::ShutdownError::signal(e.to_string()))
    }

    #[cfg(not(unix))]
    fn signal_self_terminate(&self) -> ShutdownResult<()> {
        Err(crate::error::ShutdownError::signal(
            "self-signalling is only supported on unix",
        ))
    }
}
