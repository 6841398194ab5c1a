//! Audio output using cpal and ring buffer
//!
//! Each sink owns a ring buffer drained by its own cpal output stream. The
//! stream lives on a keeper thread for the sink's whole lifetime because cpal
//! streams are not `Send` on every platform. Writers push into the ring and
//! wait on a condition variable the stream callback signals after every
//! period.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    HeapCons, HeapProd, HeapRb,
    traits::{Consumer, Producer, Split},
};
use tracing::{debug, error, warn};

use super::{AudioOutput, AudioSink, SinkPurpose, SinkSpec};
use crate::config::OutputConfig;
use crate::error::AlertError;

/// Writes that make no progress for this long fail the sink
const STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Writer wait between ring buffer pushes
const WAIT_SLICE: Duration = Duration::from_millis(5);

/// Desktop [`AudioOutput`] backed by cpal
///
/// Purposes map to configured device names; unconfigured purposes use the
/// host's default output device.
#[derive(Debug, Clone, Default)]
pub struct CpalOutput {
    devices: OutputConfig,
}

impl CpalOutput {
    pub fn new(devices: OutputConfig) -> Self {
        Self { devices }
    }

    /// Names of the output devices the default host exposes
    pub fn device_names() -> Vec<String> {
        let host = cpal::default_host();
        match host.output_devices() {
            Ok(devices) => devices.filter_map(|d| d.name().ok()).collect(),
            Err(e) => {
                warn!("Failed to enumerate output devices: {}", e);
                Vec::new()
            }
        }
    }
}

impl AudioOutput for CpalOutput {
    fn min_buffer_len(&self, spec: &SinkSpec) -> Result<usize, AlertError> {
        // ~50ms per block
        let len = spec.sample_rate as usize / 20;
        if len == 0 {
            return Err(AlertError::init(
                spec.purpose,
                format!("invalid buffer size for {} Hz", spec.sample_rate),
            ));
        }
        Ok(len)
    }

    fn open(&self, spec: &SinkSpec) -> Result<Box<dyn AudioSink>, AlertError> {
        let spec = *spec;
        let device_name = self.devices.device_for(spec.purpose).map(str::to_owned);

        // ~100ms of headroom between the writer and the stream callback
        let ring = HeapRb::<i16>::new((spec.sample_rate as usize / 10).max(1));
        let (producer, consumer) = ring.split();

        let signal = Arc::new(StreamSignal::default());
        let signal_for_stream = signal.clone();

        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), AlertError>>(1);
        let (close_tx, close_rx) = mpsc::channel::<()>();

        let keeper = thread::Builder::new()
            .name(format!("klaxon-{}", spec.purpose))
            .spawn(move || {
                match start_stream(device_name.as_deref(), &spec, consumer, signal_for_stream) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        // Sender dropped on close; the stream is released here
                        let _ = close_rx.recv();
                        drop(stream);
                        debug!("{} stream released", spec.purpose);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|e| AlertError::init(spec.purpose, format!("failed to spawn stream thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                debug!("{} stream started at {}Hz", spec.purpose, spec.sample_rate);
                Ok(Box::new(CpalSink {
                    purpose: spec.purpose,
                    producer,
                    signal,
                    close_tx: Some(close_tx),
                    keeper: Some(keeper),
                }))
            }
            Ok(Err(e)) => {
                let _ = keeper.join();
                Err(e)
            }
            Err(_) => {
                let _ = keeper.join();
                Err(AlertError::init(spec.purpose, "stream thread exited during setup"))
            }
        }
    }
}

/// State shared between a sink's writer and its stream callbacks
#[derive(Default)]
struct StreamSignal {
    failed: AtomicBool,
    drained: (Mutex<bool>, Condvar),
}

impl StreamSignal {
    fn notify(&self) {
        // notify_one() doesn't require holding the lock
        self.drained.1.notify_one();
    }

    fn fail(&self) {
        self.failed.store(true, Ordering::Release);
        self.notify();
    }

    fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    fn wait(&self, timeout: Duration) {
        let (lock, cvar) = &self.drained;
        let guard = lock.lock().unwrap_or_else(|e| {
            warn!("Sink signal mutex poisoned; continuing");
            e.into_inner()
        });
        let _ = cvar.wait_timeout(guard, timeout).unwrap_or_else(|e| {
            warn!("Sink signal wait mutex poisoned; continuing");
            e.into_inner()
        });
    }
}

/// Sink writing into a cpal stream's ring buffer
pub struct CpalSink {
    purpose: SinkPurpose,
    producer: HeapProd<i16>,
    signal: Arc<StreamSignal>,
    close_tx: Option<mpsc::Sender<()>>,
    keeper: Option<JoinHandle<()>>,
}

impl AudioSink for CpalSink {
    fn write(&mut self, block: &[i16]) -> Result<(), AlertError> {
        if self.close_tx.is_none() {
            return Err(AlertError::io(format!("{} sink is closed", self.purpose)));
        }

        let mut rest = block;
        let mut last_progress = Instant::now();
        while !rest.is_empty() {
            if self.signal.has_failed() {
                return Err(AlertError::io(format!("{} stream failed", self.purpose)));
            }

            let pushed = self.producer.push_slice(rest);
            rest = &rest[pushed..];
            if rest.is_empty() {
                break;
            }

            if pushed > 0 {
                last_progress = Instant::now();
            } else if last_progress.elapsed() >= STALL_TIMEOUT {
                return Err(AlertError::io(format!("{} stream stalled", self.purpose)));
            }
            self.signal.wait(WAIT_SLICE);
        }
        Ok(())
    }

    fn close(&mut self) {
        // Dropping the sender wakes the keeper thread, which drops the stream
        drop(self.close_tx.take());
        if let Some(keeper) = self.keeper.take() {
            let _ = keeper.join();
        }
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.close();
    }
}

fn start_stream(
    device_name: Option<&str>,
    spec: &SinkSpec,
    consumer: HeapCons<i16>,
    signal: Arc<StreamSignal>,
) -> Result<cpal::Stream, AlertError> {
    let init = |reason: String| AlertError::init(spec.purpose, reason);
    let host = cpal::default_host();

    let device = match device_name {
        Some(name) => host
            .output_devices()
            .map_err(|e| init(format!("failed to enumerate output devices: {e}")))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| init(format!("output device '{name}' not found")))?,
        None => host
            .default_output_device()
            .ok_or_else(|| init("no audio output device available".into()))?,
    };

    let rate = cpal::SampleRate(spec.sample_rate);
    let ranges: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| init(format!("failed to query output configs: {e}")))?
        .filter(|r| r.min_sample_rate() <= rate && rate <= r.max_sample_rate())
        .collect();

    // Prefer a native mono config; otherwise the sample is duplicated per channel
    let range = ranges
        .iter()
        .find(|r| r.channels() == 1)
        .or_else(|| ranges.first())
        .cloned()
        .ok_or_else(|| init(format!("no output config supports {} Hz", spec.sample_rate)))?;

    let supported = range.with_sample_rate(rate);
    let sample_format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();

    let stream = match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, consumer, signal),
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, consumer, signal),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, consumer, signal),
        other => return Err(init(format!("unsupported sample format: {other:?}"))),
    }
    .map_err(|e| init(format!("failed to build audio stream: {e}")))?;

    stream
        .play()
        .map_err(|e| init(format!("failed to play audio stream: {e}")))?;

    Ok(stream)
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut consumer: HeapCons<i16>,
    signal: Arc<StreamSignal>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<i16>,
{
    let channels = usize::from(config.channels.max(1));
    let error_signal = signal.clone();
    // Pre-allocate buffer for batch reads
    let mut mono: Vec<i16> = vec![0; 4096];

    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let frames = data.len() / channels;
            if mono.len() < frames {
                mono.resize(frames, 0);
            }
            let popped = consumer.pop_slice(&mut mono[..frames]);
            // Silence past what the writer supplied
            mono[popped..frames].fill(0);

            for (frame, &sample) in data.chunks_mut(channels).zip(mono.iter()) {
                frame.fill(T::from_sample_(sample));
            }

            signal.notify();
        },
        move |err| {
            error!("Audio stream error: {}", err);
            error_signal.fail();
        },
        None,
    )
}
