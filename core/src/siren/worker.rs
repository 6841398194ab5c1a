//! Siren worker thread implementation
//!
//! Generates blocks of the siren waveform and writes each one to every sink
//! of the session until the running flag clears or a write fails.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::{debug, error};

use super::SirenMode;
use super::handle::SessionHandle;
use super::metrics::{ExitReason, SessionMetrics, SessionSummary};
use crate::error::AlertError;
use crate::output::AudioSink;
use crate::waveform::{SirenWaveform, WaveformParams};

/// Open sinks of one session, in write order
///
/// Closes every sink when dropped, so sinks are released even if the worker
/// never starts.
pub(super) struct SinkSet {
    sinks: Vec<Box<dyn AudioSink>>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self { sinks: Vec::with_capacity(2) }
    }

    pub fn push(&mut self, sink: Box<dyn AudioSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Write one block to every sink, primary first.
    fn write_all(&mut self, block: &[i16]) -> Result<(), AlertError> {
        for sink in &mut self.sinks {
            sink.write(block)?;
        }
        Ok(())
    }

    /// Close and release every sink. Returns how many were closed.
    pub fn close_all(&mut self) -> usize {
        let count = self.sinks.len();
        for mut sink in self.sinks.drain(..) {
            sink.close();
        }
        count
    }
}

impl Drop for SinkSet {
    fn drop(&mut self) {
        self.close_all();
    }
}

/// Siren worker state, owned by the worker thread
pub(super) struct SirenWorker {
    sinks: SinkSet,
    waveform: SirenWaveform,
    /// Pre-allocated block (reused every write)
    block: Vec<i16>,
    running: Arc<AtomicBool>,
    metrics: SessionMetrics,
}

impl SirenWorker {
    /// Spawn the worker thread for an already opened set of sinks.
    ///
    /// The caller sets `running` before spawning. On spawn failure the sinks
    /// are closed and `running` is cleared.
    pub fn spawn(
        mode: SirenMode,
        sinks: SinkSet,
        params: WaveformParams,
        block_len: usize,
        running: Arc<AtomicBool>,
    ) -> Result<SessionHandle, AlertError> {
        let purpose = mode.purposes()[0];
        let flag = running.clone();

        let thread = thread::Builder::new()
            .name("siren-worker".into())
            .spawn(move || {
                let mut worker = Self {
                    sinks,
                    waveform: SirenWaveform::new(params),
                    block: vec![0; block_len.max(1)],
                    running,
                    metrics: SessionMetrics::new(),
                };
                worker.run()
            })
            .map_err(|e| {
                flag.store(false, Ordering::Release);
                AlertError::init(purpose, format!("failed to spawn siren worker: {e}"))
            })?;

        Ok(SessionHandle {
            mode,
            thread: Some(thread),
        })
    }

    /// Worker loop; tears the session down itself before returning.
    fn run(&mut self) -> SessionSummary {
        debug!("Siren worker started ({} sinks)", self.sinks.len());

        let exit = self.play();

        let closed = self.sinks.close_all();
        self.running.store(false, Ordering::Release);

        self.metrics
            .finish(self.waveform.segment_switches(), closed, exit)
    }

    fn play(&mut self) -> ExitReason {
        let running = &self.running;
        loop {
            if !running.load(Ordering::Acquire) {
                return ExitReason::Stopped;
            }

            let filled = self
                .waveform
                .fill_while(&mut self.block, || running.load(Ordering::Relaxed));
            if filled < self.block.len() {
                // Stop observed mid-block; the partial block is dropped
                return ExitReason::Stopped;
            }

            if let Err(e) = self.sinks.write_all(&self.block) {
                error!("Siren write failed, stopping session: {}", e);
                return ExitReason::WriteFailed(e.to_string());
            }
            self.metrics.record_block(filled);
        }
    }
}
