//! Host-facing alert facade
//!
//! Bundles the siren and strobe controllers behind `&self` methods the host
//! can call from any thread, and performs the best-effort volume preparation
//! that precedes a siren session.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::config::Config;
use crate::error::AlertError;
use crate::output::AudioOutput;
use crate::platform::{StreamKind, Torch, Volume, boost_streams};
use crate::siren::{SirenController, SirenMode, SirenStart, SirenStop};
use crate::strobe::{StrobeController, StrobeStart, StrobeStop};

/// Streams raised before a single-mode siren
const SIREN_STREAMS: &[StreamKind] = &[StreamKind::Music, StreamKind::Alarm, StreamKind::Ring];

/// Streams raised before a dual-mode (simulated call) siren
const CALL_STREAMS: &[StreamKind] = &[StreamKind::VoiceCall];

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|e| {
        warn!("{} mutex poisoned; continuing", what);
        e.into_inner()
    })
}

/// Panic alert service: siren, strobe and their platform preparation
pub struct AlertService {
    siren: Mutex<SirenController>,
    strobe: Mutex<StrobeController>,
    volume: Arc<dyn Volume>,
}

impl AlertService {
    pub fn new(
        config: &Config,
        output: Arc<dyn AudioOutput>,
        torch: Arc<dyn Torch>,
        volume: Arc<dyn Volume>,
    ) -> Result<Self, AlertError> {
        Ok(Self {
            siren: Mutex::new(SirenController::new(output, config.siren.clone())),
            strobe: Mutex::new(StrobeController::new(torch, config.strobe.period())?),
            volume,
        })
    }

    /// Raise output volume and start the siren.
    ///
    /// Volume preparation is best-effort; only opening the audio output can
    /// fail the call.
    pub fn start_siren(&self, mode: SirenMode) -> Result<SirenStart, AlertError> {
        let mut siren = lock(&self.siren, "Siren");
        if siren.is_playing() && siren.mode() == Some(mode) {
            return Ok(SirenStart::AlreadyPlaying);
        }

        let previous = siren.mode();
        match mode {
            SirenMode::Single => {
                if previous == Some(SirenMode::Dual) {
                    self.leave_call_mode();
                }
                boost_streams(self.volume.as_ref(), SIREN_STREAMS);
            }
            SirenMode::Dual => {
                if let Err(e) = self.volume.set_call_mode(true) {
                    warn!("Failed to enter call audio mode: {}", e);
                }
                boost_streams(self.volume.as_ref(), CALL_STREAMS);
            }
        }

        let result = siren.start(mode);
        if result.is_err() && mode == SirenMode::Dual {
            self.leave_call_mode();
        }
        result
    }

    /// Stop the siren, leaving call audio mode if the session was dual.
    pub fn stop_siren(&self) -> SirenStop {
        let mut siren = lock(&self.siren, "Siren");
        let mode = siren.mode();
        let stopped = siren.stop();
        if mode == Some(SirenMode::Dual) {
            self.leave_call_mode();
        }
        stopped
    }

    pub fn start_strobe(&self) -> Result<StrobeStart, AlertError> {
        lock(&self.strobe, "Strobe").start()
    }

    pub fn stop_strobe(&self) -> StrobeStop {
        lock(&self.strobe, "Strobe").stop()
    }

    pub fn is_siren_playing(&self) -> bool {
        lock(&self.siren, "Siren").is_playing()
    }

    /// Mode of the playing siren, `None` when silent
    pub fn siren_mode(&self) -> Option<SirenMode> {
        let siren = lock(&self.siren, "Siren");
        if siren.is_playing() { siren.mode() } else { None }
    }

    pub fn is_strobing(&self) -> bool {
        lock(&self.strobe, "Strobe").is_strobing()
    }

    /// Stop everything the service started.
    pub fn shutdown(&self) {
        self.stop_siren();
        self.stop_strobe();
        info!("Alert service shut down");
    }

    fn leave_call_mode(&self) {
        if let Err(e) = self.volume.set_call_mode(false) {
            warn!("Failed to leave call audio mode: {}", e);
        }
    }
}
