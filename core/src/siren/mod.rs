//! Siren playback
//!
//! A dedicated worker thread synthesizes the alternating-tone square wave and
//! pushes it to one or two sinks until told to stop.
//!
//! # Architecture
//!
//! ```text
//! Host Thread                    Siren Worker                  Device
//!     │                                │                           │
//! [start(mode)]                        │                           │
//!     │ open sinks                     │                           │
//!     │ running = true                 │                           │
//!     │──────────(spawn)─────────────►[Fill block]                 │
//!     │                              [Write primary]────────────►[Play]
//!     │                              [Write secondary]──────────►[Play]
//! [stop()]                             │                           │
//!     │ running = false ─ ─ ─(poll)─ ─►[Exit loop]                 │
//!     │                              [Close sinks]──────────────►[Release]
//!     │◄─────────(join)──────────────[running = false]             │
//! ```
//!
//! The only state shared across threads is the `running` flag. Sinks are
//! opened on the host thread so open failures are reported synchronously,
//! then moved into the worker, which is their single writer and closes them.

mod controller;
mod handle;
mod metrics;
mod worker;

#[cfg(test)]
mod tests;

use std::fmt;

pub use controller::SirenController;
pub use metrics::{ExitReason, SessionSummary};

use crate::output::SinkPurpose;

/// Which outputs a siren session plays through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SirenMode {
    /// Alert stream only
    Single,
    /// In-call and ringer streams together (simulated incoming call)
    Dual,
}

impl SirenMode {
    /// Sink purposes in write order (primary first)
    pub fn purposes(self) -> &'static [SinkPurpose] {
        match self {
            SirenMode::Single => &[SinkPurpose::Alert],
            SirenMode::Dual => &[SinkPurpose::InCall, SinkPurpose::Ringer],
        }
    }
}

impl fmt::Display for SirenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SirenMode::Single => "single",
            SirenMode::Dual => "dual",
        })
    }
}

/// Outcome of a successful [`SirenController::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SirenStart {
    AlreadyPlaying,
    Playing,
}

impl SirenStart {
    pub fn as_str(self) -> &'static str {
        match self {
            SirenStart::AlreadyPlaying => "already_playing",
            SirenStart::Playing => "playing",
        }
    }
}

/// Outcome of [`SirenController::stop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SirenStop {
    Stopped,
}

impl SirenStop {
    pub fn as_str(self) -> &'static str {
        "stopped"
    }
}
