//! Siren session lifecycle
//!
//! `Idle → Starting → Playing → Stopping → Idle`. Starting and stopping are
//! the windows in which sinks are being opened or the worker is being joined.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use super::handle::SessionHandle;
use super::metrics::SessionSummary;
use super::worker::{SinkSet, SirenWorker};
use super::{SirenMode, SirenStart, SirenStop};
use crate::config::SirenConfig;
use crate::error::AlertError;
use crate::output::{AudioOutput, SinkSpec};

/// Owns the siren's running flag, its worker and (through the worker) its sinks
pub struct SirenController {
    output: Arc<dyn AudioOutput>,
    config: SirenConfig,

    /// Cleared by `stop()` or by the worker when it exits
    running: Arc<AtomicBool>,

    session: Option<SessionHandle>,
    last_session: Option<SessionSummary>,
}

impl SirenController {
    pub fn new(output: Arc<dyn AudioOutput>, config: SirenConfig) -> Self {
        Self {
            output,
            config,
            running: Arc::new(AtomicBool::new(false)),
            session: None,
            last_session: None,
        }
    }

    pub fn config(&self) -> &SirenConfig {
        &self.config
    }

    /// True while a worker is producing sound
    pub fn is_playing(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Mode of the current session, including one that ended on a write
    /// failure and has not been reaped yet
    pub fn mode(&self) -> Option<SirenMode> {
        self.session.as_ref().map(SessionHandle::mode)
    }

    /// Summary of the most recently joined session
    pub fn last_session(&self) -> Option<&SessionSummary> {
        self.last_session.as_ref()
    }

    /// Start a siren session.
    ///
    /// Returns immediately once the worker is spawned. A session of another
    /// mode is stopped and joined before any new sink is opened.
    pub fn start(&mut self, mode: SirenMode) -> Result<SirenStart, AlertError> {
        if let Some(session) = &self.session {
            if session.mode() == mode && self.is_playing() && !session.is_finished() {
                return Ok(SirenStart::AlreadyPlaying);
            }
            debug!("Replacing {} siren session with {}", session.mode(), mode);
        }
        self.stop();

        let params = self.config.waveform();
        let (sinks, block_len) = self.open_sinks(mode)?;

        self.running.store(true, Ordering::Release);
        let session = SirenWorker::spawn(mode, sinks, params, block_len, self.running.clone())?;
        self.session = Some(session);

        info!("Siren playing ({} mode, {} sample blocks)", mode, block_len);
        Ok(SirenStart::Playing)
    }

    /// Request the worker to stop and wait for its teardown. Idempotent.
    pub fn stop(&mut self) -> SirenStop {
        self.running.store(false, Ordering::Release);

        if let Some(session) = self.session.take() {
            let mode = session.mode();
            if let Some(summary) = session.join() {
                info!("Siren stopped ({} mode)", mode);
                self.last_session = Some(summary);
            }
        }

        SirenStop::Stopped
    }

    /// Open every sink for `mode` in write order.
    ///
    /// If any open fails, sinks already opened are closed before returning.
    fn open_sinks(&self, mode: SirenMode) -> Result<(SinkSet, usize), AlertError> {
        let mut sinks = SinkSet::new();
        let mut block_len = self.config.block_len;

        for &purpose in mode.purposes() {
            let spec = SinkSpec::pcm16_mono(purpose, self.config.sample_rate);

            let min = self.output.min_buffer_len(&spec)?;
            if min == 0 {
                return Err(AlertError::init(purpose, "invalid minimum buffer size"));
            }
            block_len = block_len.max(min);

            match self.output.open(&spec) {
                Ok(sink) => sinks.push(sink),
                Err(e) => {
                    warn!("Failed to open {} sink: {}", purpose, e);
                    // Dropping the set closes what was already opened
                    return Err(e);
                }
            }
        }

        Ok((sinks, block_len))
    }
}

impl Drop for SirenController {
    fn drop(&mut self) {
        self.stop();
    }
}
