//! Klaxon Core - personal-safety alert engine
//!
//! Drives a device's alerting hardware at full intensity: a loud
//! alternating-tone siren written to one or two live audio outputs, and a
//! strobing camera torch.
//!
//! # Architecture
//!
//! - [`SirenWaveform`] - Deterministic 600/1400 Hz square wave synthesis
//! - [`AudioOutput`] / [`AudioSink`] - Platform audio channel abstraction
//! - [`SirenController`] - Siren session lifecycle and its worker thread
//! - [`StrobeController`] - Torch pulse loop on a single-threaded timer
//! - [`AlertService`] - Host-facing facade with volume preparation

pub mod config;
pub mod error;
pub mod output;
pub mod platform;
pub mod service;
pub mod siren;
pub mod strobe;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod waveform;

pub use config::{Config, ConfigError};
pub use error::{AlertError, ErrorKind};
pub use output::{AudioOutput, AudioSink, SinkPurpose, SinkSpec};
pub use platform::{NoVolumeControl, StreamKind, Torch, Volume};
pub use service::AlertService;
pub use siren::{SirenController, SirenMode, SirenStart, SirenStop};
pub use strobe::{StrobeController, StrobeStart, StrobeStop};
pub use waveform::{SirenWaveform, WaveformParams};
