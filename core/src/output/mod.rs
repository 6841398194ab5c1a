//! Audio output abstraction
//!
//! A [`AudioOutput`] opens [`AudioSink`]s, one per platform output channel.
//! The siren writes identical 16-bit mono blocks to one sink (single mode) or
//! two sinks of different routing purpose (dual mode).

use std::fmt;

use crate::error::AlertError;

#[cfg(feature = "cpal")]
pub mod desktop;

#[cfg(feature = "cpal")]
pub use desktop::CpalOutput;

/// Routing semantics of an output channel
///
/// Opaque to the siren; host adapters map each purpose to a platform stream
/// or device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkPurpose {
    /// Alarm/siren stream, loudspeaker
    Alert,
    /// Voice call stream (earpiece or hands-free link)
    InCall,
    /// Ringtone stream
    Ringer,
}

impl SinkPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            SinkPurpose::Alert => "alert",
            SinkPurpose::InCall => "in-call",
            SinkPurpose::Ringer => "ringer",
        }
    }
}

impl fmt::Display for SinkPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelLayout {
    #[default]
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleEncoding {
    /// Signed 16-bit linear PCM
    #[default]
    Pcm16,
}

/// Everything needed to open one sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkSpec {
    pub purpose: SinkPurpose,
    pub sample_rate: u32,
    pub layout: ChannelLayout,
    pub encoding: SampleEncoding,
}

impl SinkSpec {
    /// Mono 16-bit PCM spec for a purpose
    pub fn pcm16_mono(purpose: SinkPurpose, sample_rate: u32) -> Self {
        Self {
            purpose,
            sample_rate,
            layout: ChannelLayout::Mono,
            encoding: SampleEncoding::Pcm16,
        }
    }
}

/// One open platform output channel
///
/// Written from a single thread. `close` may come from another thread once
/// writes have ceased.
pub trait AudioSink: Send {
    /// Blocking write of one block of samples.
    fn write(&mut self, block: &[i16]) -> Result<(), AlertError>;

    /// Stop and release the device. Idempotent.
    fn close(&mut self);
}

/// Factory for sinks
pub trait AudioOutput: Send + Sync {
    /// Minimum block length (in samples) the output accepts for `spec`.
    fn min_buffer_len(&self, spec: &SinkSpec) -> Result<usize, AlertError> {
        Ok(spec.sample_rate as usize / 20)
    }

    /// Open and start a sink.
    fn open(&self, spec: &SinkSpec) -> Result<Box<dyn AudioSink>, AlertError>;
}
