//! Host platform services consumed by the alert core
//!
//! Torch and volume control belong to the host. The core only calls into
//! these traits and never owns the underlying hardware.

use std::fmt;

use tracing::{debug, warn};

use crate::error::AlertError;

/// Camera torch capability
pub trait Torch: Send + Sync {
    /// Torch-capable devices; empty when the capability is unavailable.
    fn list_devices(&self) -> Result<Vec<String>, AlertError>;

    /// Switch the torch of `device` on or off.
    fn set_level(&self, device: &str, on: bool) -> Result<(), AlertError>;
}

/// Platform volume streams the siren may route through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Music,
    Alarm,
    Ring,
    VoiceCall,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StreamKind::Music => "music",
            StreamKind::Alarm => "alarm",
            StreamKind::Ring => "ring",
            StreamKind::VoiceCall => "voice-call",
        })
    }
}

/// Host volume and audio-session control
///
/// Every call is best-effort from the core's point of view.
pub trait Volume: Send + Sync {
    fn stream_max_level(&self, kind: StreamKind) -> Result<u32, AlertError>;

    fn set_level(&self, kind: StreamKind, level: u32) -> Result<(), AlertError>;

    /// Raise a stream to its maximum level.
    fn set_max(&self, kind: StreamKind) -> Result<(), AlertError> {
        let max = self.stream_max_level(kind)?;
        self.set_level(kind, max)
    }

    /// Whether system-level volume limiting (do-not-disturb policy) is
    /// suppressed for this application.
    fn limiting_suppressed(&self) -> bool {
        true
    }

    /// Enter or leave the in-communication audio mode used by the dual siren.
    fn set_call_mode(&self, _on: bool) -> Result<(), AlertError> {
        Ok(())
    }
}

/// Volume control for hosts without per-stream levels
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVolumeControl;

impl Volume for NoVolumeControl {
    fn stream_max_level(&self, _kind: StreamKind) -> Result<u32, AlertError> {
        Ok(0)
    }

    fn set_level(&self, _kind: StreamKind, _level: u32) -> Result<(), AlertError> {
        Ok(())
    }
}

/// Raise every stream in `kinds` to maximum, logging failures.
pub fn boost_streams(volume: &dyn Volume, kinds: &[StreamKind]) {
    if !volume.limiting_suppressed() {
        warn!("Volume limiting is not suppressed; the system may cap siren volume");
    }
    for &kind in kinds {
        match volume.set_max(kind) {
            Ok(()) => debug!("{} stream set to max", kind),
            Err(e) => warn!("Failed to raise {} stream volume: {}", kind, e),
        }
    }
}
