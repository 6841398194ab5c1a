//! Single-threaded timer scheduler
//!
//! A tokio current-thread runtime driven by one named thread. Every task
//! spawned here runs on that thread, so at most one of them executes at a
//! time.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::AlertError;

pub(super) struct Scheduler {
    handle: Handle,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn spawn(name: &str) -> Result<Self, AlertError> {
        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| AlertError::CapabilityInit(format!("timer runtime: {e}")))?;
        let handle = runtime.handle().clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = thread::Builder::new()
            .name(name.into())
            .spawn(move || {
                // Resolves when the sender is used or dropped
                let _ = runtime.block_on(shutdown_rx);
                debug!("Timer scheduler finished");
            })
            .map_err(|e| AlertError::CapabilityInit(format!("timer thread: {e}")))?;

        Ok(Self {
            handle,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Run `f` on the scheduler thread and wait for its result.
    ///
    /// Must not be called from the scheduler thread itself.
    pub fn run<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        self.handle.spawn(async move {
            let _ = tx.send(f());
        });
        match rx.recv() {
            Ok(result) => Some(result),
            Err(_) => {
                warn!("Timer scheduler dropped a queued action");
                None
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        drop(self.shutdown.take());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
