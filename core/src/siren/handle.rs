//! Siren worker handle
//!
//! Owns the worker's join handle for the session's lifetime.

use std::thread::JoinHandle;

use tracing::warn;

use super::SirenMode;
use super::metrics::SessionSummary;

/// Handle to a running siren worker
///
/// Returned from `SirenWorker::spawn()`. Dropping it waits for the worker;
/// clear the running flag first or the drop never returns.
pub(super) struct SessionHandle {
    pub(super) mode: SirenMode,

    /// Thread join handle (Option to allow join from both `join` and `Drop`)
    pub(super) thread: Option<JoinHandle<SessionSummary>>,
}

impl SessionHandle {
    pub fn mode(&self) -> SirenMode {
        self.mode
    }

    /// Check if the worker has already exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }

    /// Wait for the worker's teardown and collect its summary.
    ///
    /// Returns `None` if the worker panicked.
    pub fn join(mut self) -> Option<SessionSummary> {
        let thread = self.thread.take()?;
        match thread.join() {
            Ok(summary) => Some(summary),
            Err(_) => {
                warn!("Siren worker panicked");
                None
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
