//! Strobe pulse lifecycle
//!
//! `Off → Pulsing → Off`. The pulse task and the final "off" command both run
//! on the scheduler thread, so torch commands never overlap.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::scheduler::Scheduler;
use super::{StrobeStart, StrobeStop};
use crate::error::AlertError;
use crate::platform::Torch;

struct PulseSession {
    device: String,
    task: JoinHandle<()>,
}

/// Owns the strobe's running flag, its timer and its pulse task
pub struct StrobeController {
    torch: Arc<dyn Torch>,
    period: Duration,
    scheduler: Scheduler,

    /// Cleared by `stop()` or by the pulse task on a torch failure
    running: Arc<AtomicBool>,

    pulse: Option<PulseSession>,
}

impl StrobeController {
    pub fn new(torch: Arc<dyn Torch>, period: Duration) -> Result<Self, AlertError> {
        Ok(Self {
            torch,
            // Zero periods would spin the timer
            period: period.max(Duration::from_millis(1)),
            scheduler: Scheduler::spawn("strobe-timer")?,
            running: Arc::new(AtomicBool::new(false)),
            pulse: None,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_strobing(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start pulsing the first torch device.
    ///
    /// Errors from the capability query are returned; torch command failures
    /// after this returns only end the pulse loop and are logged.
    pub fn start(&mut self) -> Result<StrobeStart, AlertError> {
        if self.is_strobing() {
            return Ok(StrobeStart::NotSupportedOrAlreadyStrobing);
        }

        let Some(device) = self.torch.list_devices()?.into_iter().next() else {
            debug!("No torch device available");
            return Ok(StrobeStart::NotSupportedOrAlreadyStrobing);
        };

        // A loop that ended on a torch failure is finished; drop its handle
        if let Some(old) = self.pulse.take() {
            old.task.abort();
        }

        self.running.store(true, Ordering::Release);
        let task = self.scheduler.handle().spawn(pulse_loop(
            self.torch.clone(),
            device.clone(),
            self.period,
            self.running.clone(),
        ));
        self.pulse = Some(PulseSession { device, task });

        info!("Strobe started ({}ms period)", self.period.as_millis());
        Ok(StrobeStart::Started)
    }

    /// Stop pulsing and switch the torch off. Idempotent.
    pub fn stop(&mut self) -> StrobeStop {
        self.running.store(false, Ordering::Release);

        let device = match self.pulse.take() {
            Some(pulse) => {
                pulse.task.abort();
                Some(pulse.device)
            }
            None => match self.torch.list_devices() {
                Ok(devices) => devices.into_iter().next(),
                Err(e) => {
                    warn!("Failed to list torch devices: {}", e);
                    None
                }
            },
        };

        if let Some(device) = device {
            // Queued behind any in-flight pulse, so it is the last command
            let torch = self.torch.clone();
            match self.scheduler.run(move || torch.set_level(&device, false)) {
                Some(Ok(())) => {}
                Some(Err(e)) => warn!("Failed to switch torch off: {}", e),
                None => warn!("Torch off command was not executed"),
            }
        }

        debug!("Strobe stopped");
        StrobeStop::Stopped
    }
}

impl Drop for StrobeController {
    fn drop(&mut self) {
        if self.pulse.is_some() {
            self.stop();
        }
    }
}

async fn pulse_loop(torch: Arc<dyn Torch>, device: String, period: Duration, running: Arc<AtomicBool>) {
    let mut torch_on = false;
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // First tick completes immediately
        ticker.tick().await;
        if !running.load(Ordering::Acquire) {
            break;
        }

        torch_on = !torch_on;
        if let Err(e) = torch.set_level(&device, torch_on) {
            running.store(false, Ordering::Release);
            error!("Strobe stopped, torch command failed: {}", e);
            break;
        }
    }
}
