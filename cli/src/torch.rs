//! Torch stand-in for desktops
//!
//! Desktops have no camera flash, so pulses are reported through the log.

use std::sync::atomic::{AtomicU64, Ordering};

use klaxon_core::{AlertError, Torch};
use tracing::info;

/// Logs every torch command and counts the "on" pulses
#[derive(Debug, Default)]
pub struct LogTorch {
    flashes: AtomicU64,
}

impl LogTorch {
    pub const DEVICE: &'static str = "log";

    pub fn flashes(&self) -> u64 {
        self.flashes.load(Ordering::Relaxed)
    }
}

impl Torch for LogTorch {
    fn list_devices(&self) -> Result<Vec<String>, AlertError> {
        Ok(vec![Self::DEVICE.to_string()])
    }

    fn set_level(&self, device: &str, on: bool) -> Result<(), AlertError> {
        if on {
            self.flashes.fetch_add(1, Ordering::Relaxed);
        }
        info!(target: "klaxon::torch", "{} {}", device, if on { "ON" } else { "off" });
        Ok(())
    }
}
