//! Siren session accounting

use std::time::{Duration, Instant};

use tracing::debug;

/// Why a siren worker left its loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The running flag was cleared
    Stopped,
    /// A sink write failed; the session tore itself down
    WriteFailed(String),
}

/// Totals for one finished siren session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Blocks written to every sink
    pub blocks_written: u64,
    /// Samples written per sink
    pub samples_written: u64,
    /// Tone alternations generated
    pub segment_switches: u64,
    /// Sinks closed by the worker on exit
    pub sinks_closed: usize,
    /// Wall time from first block to exit
    pub elapsed: Duration,
    pub exit: ExitReason,
}

/// Running counters, owned by the worker thread
#[derive(Debug, Clone)]
pub(super) struct SessionMetrics {
    pub blocks_written: u64,
    pub samples_written: u64,
    pub started: Instant,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            blocks_written: 0,
            samples_written: 0,
            started: Instant::now(),
        }
    }

    pub fn record_block(&mut self, samples: usize) {
        self.blocks_written += 1;
        self.samples_written += samples as u64;
    }

    pub fn finish(
        &self,
        segment_switches: u64,
        sinks_closed: usize,
        exit: ExitReason,
    ) -> SessionSummary {
        let summary = SessionSummary {
            blocks_written: self.blocks_written,
            samples_written: self.samples_written,
            segment_switches,
            sinks_closed,
            elapsed: self.started.elapsed(),
            exit,
        };
        debug!(
            "Siren session: {} blocks, {} samples, {} switches in {:.2}s ({:?})",
            summary.blocks_written,
            summary.samples_written,
            summary.segment_switches,
            summary.elapsed.as_secs_f64(),
            summary.exit
        );
        summary
    }
}
