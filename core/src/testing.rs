//! Instrumented fakes for the host platform interfaces
//!
//! Used by the unit tests and, through the `testing` feature, by host
//! integration tests that need to observe what the core did to the hardware.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::AlertError;
use crate::output::{AudioOutput, AudioSink, SinkPurpose, SinkSpec};
use crate::platform::{StreamKind, Torch, Volume};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// ============================================================================
// Audio output
// ============================================================================

/// Everything one fake sink saw
#[derive(Debug, Clone)]
pub struct SinkRecord {
    pub purpose: SinkPurpose,
    pub sample_rate: u32,
    pub blocks: Vec<Vec<i16>>,
    pub close_count: usize,
    pub opened_at: Instant,
    pub closed_at: Option<Instant>,
}

impl SinkRecord {
    pub fn samples_written(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }
}

#[derive(Debug, Default)]
struct OutputLog {
    sinks: Vec<SinkRecord>,
    open_now: usize,
    max_open: usize,
    max_open_same_purpose: usize,
    fail_open: Vec<SinkPurpose>,
    fail_write_after: Option<(SinkPurpose, usize)>,
    min_buffer_len: Option<usize>,
}

impl OutputLog {
    fn open_with_purpose(&self, purpose: SinkPurpose) -> usize {
        self.sinks
            .iter()
            .filter(|s| s.purpose == purpose && s.close_count == 0)
            .count()
    }
}

/// Fake [`AudioOutput`] that records every open, write and close
///
/// Writes block for the real-time duration of the block, like a device
/// playing it back.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    log: Arc<Mutex<OutputLog>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every open for `purpose` fail with an init failure.
    pub fn fail_open(self, purpose: SinkPurpose) -> Self {
        lock(&self.log).fail_open.push(purpose);
        self
    }

    /// Make writes to `purpose` sinks fail once `blocks` blocks were accepted.
    pub fn fail_writes_after(self, purpose: SinkPurpose, blocks: usize) -> Self {
        lock(&self.log).fail_write_after = Some((purpose, blocks));
        self
    }

    /// Override the minimum block length (0 simulates an invalid buffer size).
    pub fn with_min_buffer_len(self, len: usize) -> Self {
        lock(&self.log).min_buffer_len = Some(len);
        self
    }

    /// Snapshot of every sink ever opened, in open order
    pub fn sinks(&self) -> Vec<SinkRecord> {
        lock(&self.log).sinks.clone()
    }

    pub fn open_now(&self) -> usize {
        lock(&self.log).open_now
    }

    /// Highest number of simultaneously open sinks
    pub fn max_concurrent_open(&self) -> usize {
        lock(&self.log).max_open
    }

    /// Highest number of simultaneously open sinks sharing one purpose
    pub fn max_concurrent_same_purpose(&self) -> usize {
        lock(&self.log).max_open_same_purpose
    }

    /// Wait until at least `samples` samples reached the first sink.
    pub fn wait_for_samples(&self, samples: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let written = lock(&self.log)
                .sinks
                .last()
                .map(SinkRecord::samples_written)
                .unwrap_or(0);
            if written >= samples {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }
}

impl AudioOutput for RecordingOutput {
    fn min_buffer_len(&self, spec: &SinkSpec) -> Result<usize, AlertError> {
        Ok(lock(&self.log)
            .min_buffer_len
            .unwrap_or(spec.sample_rate as usize / 20))
    }

    fn open(&self, spec: &SinkSpec) -> Result<Box<dyn AudioSink>, AlertError> {
        let mut log = lock(&self.log);
        if log.fail_open.contains(&spec.purpose) {
            return Err(AlertError::init(spec.purpose, "device unavailable"));
        }

        log.sinks.push(SinkRecord {
            purpose: spec.purpose,
            sample_rate: spec.sample_rate,
            blocks: Vec::new(),
            close_count: 0,
            opened_at: Instant::now(),
            closed_at: None,
        });
        log.open_now += 1;
        log.max_open = log.max_open.max(log.open_now);
        let same = log.open_with_purpose(spec.purpose);
        log.max_open_same_purpose = log.max_open_same_purpose.max(same);

        Ok(Box::new(RecordingSink {
            index: log.sinks.len() - 1,
            purpose: spec.purpose,
            sample_rate: spec.sample_rate.max(1),
            closed: false,
            log: self.log.clone(),
        }))
    }
}

struct RecordingSink {
    index: usize,
    purpose: SinkPurpose,
    sample_rate: u32,
    closed: bool,
    log: Arc<Mutex<OutputLog>>,
}

impl AudioSink for RecordingSink {
    fn write(&mut self, block: &[i16]) -> Result<(), AlertError> {
        if self.closed {
            return Err(AlertError::io("write after close"));
        }
        {
            let mut log = lock(&self.log);
            let accepted = log.sinks[self.index].blocks.len();
            if let Some((purpose, limit)) = log.fail_write_after {
                if purpose == self.purpose && accepted >= limit {
                    return Err(AlertError::io(format!("{} device disconnected", purpose)));
                }
            }
            log.sinks[self.index].blocks.push(block.to_vec());
        }
        thread::sleep(Duration::from_secs_f64(
            block.len() as f64 / f64::from(self.sample_rate),
        ));
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let mut log = lock(&self.log);
        let record = &mut log.sinks[self.index];
        record.close_count += 1;
        record.closed_at = Some(Instant::now());
        log.open_now -= 1;
    }
}

// ============================================================================
// Torch
// ============================================================================

/// One accepted torch command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorchCommand {
    pub at: Instant,
    pub device: String,
    pub on: bool,
}

/// Fake [`Torch`] recording every level command with its time
#[derive(Debug, Default)]
pub struct RecordingTorch {
    devices: Vec<String>,
    commands: Mutex<Vec<TorchCommand>>,
    fail_after: Option<usize>,
    list_error: Option<AlertError>,
}

impl RecordingTorch {
    /// Torch with one device, "0"
    pub fn new() -> Self {
        Self::with_devices(&["0"])
    }

    /// Torch with no devices (capability unavailable)
    pub fn unavailable() -> Self {
        Self::with_devices(&[])
    }

    pub fn with_devices(devices: &[&str]) -> Self {
        Self {
            devices: devices.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Fail every command after `accepted` commands succeeded.
    pub fn fail_after(mut self, accepted: usize) -> Self {
        self.fail_after = Some(accepted);
        self
    }

    /// Make device listing itself fail.
    pub fn failing_list(mut self, error: AlertError) -> Self {
        self.list_error = Some(error);
        self
    }

    pub fn commands(&self) -> Vec<TorchCommand> {
        lock(&self.commands).clone()
    }

    pub fn levels(&self) -> Vec<bool> {
        lock(&self.commands).iter().map(|c| c.on).collect()
    }

    pub fn last_level(&self) -> Option<bool> {
        lock(&self.commands).last().map(|c| c.on)
    }
}

impl Torch for RecordingTorch {
    fn list_devices(&self) -> Result<Vec<String>, AlertError> {
        match &self.list_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.devices.clone()),
        }
    }

    fn set_level(&self, device: &str, on: bool) -> Result<(), AlertError> {
        if !self.devices.iter().any(|d| d == device) {
            return Err(AlertError::io(format!("unknown torch device {device}")));
        }
        let mut commands = lock(&self.commands);
        if let Some(limit) = self.fail_after {
            if commands.len() >= limit {
                return Err(AlertError::io("torch in use by another client"));
            }
        }
        commands.push(TorchCommand {
            at: Instant::now(),
            device: device.to_string(),
            on,
        });
        Ok(())
    }
}

// ============================================================================
// Volume
// ============================================================================

/// One call observed by [`RecordingVolume`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeCall {
    SetLevel(StreamKind, u32),
    CallMode(bool),
}

/// Fake [`Volume`] with a max level of 15 on every stream
#[derive(Debug, Default)]
pub struct RecordingVolume {
    calls: Mutex<Vec<VolumeCall>>,
    limiting: bool,
    denied: bool,
}

impl RecordingVolume {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report that volume limiting is active.
    pub fn with_limiting(mut self) -> Self {
        self.limiting = true;
        self
    }

    /// Reject every level change with a permission failure.
    pub fn denied(mut self) -> Self {
        self.denied = true;
        self
    }

    pub fn calls(&self) -> Vec<VolumeCall> {
        lock(&self.calls).clone()
    }
}

impl Volume for RecordingVolume {
    fn stream_max_level(&self, _kind: StreamKind) -> Result<u32, AlertError> {
        Ok(15)
    }

    fn set_level(&self, kind: StreamKind, level: u32) -> Result<(), AlertError> {
        if self.denied {
            return Err(AlertError::PermissionFailure(format!("{kind} volume")));
        }
        lock(&self.calls).push(VolumeCall::SetLevel(kind, level));
        Ok(())
    }

    fn limiting_suppressed(&self) -> bool {
        !self.limiting
    }

    fn set_call_mode(&self, on: bool) -> Result<(), AlertError> {
        lock(&self.calls).push(VolumeCall::CallMode(on));
        Ok(())
    }
}
