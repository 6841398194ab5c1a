//! Strobe light
//!
//! Toggles the camera torch on a fixed period from a recurring timer task.
//! The timer runs on a single-threaded scheduler; only one pulse is ever in
//! flight, and the torch level is local to the pulse task.

mod controller;
mod scheduler;

#[cfg(test)]
mod tests;

pub use controller::StrobeController;

/// Outcome of a successful [`StrobeController::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrobeStart {
    Started,
    NotSupportedOrAlreadyStrobing,
}

impl StrobeStart {
    pub fn as_str(self) -> &'static str {
        match self {
            StrobeStart::Started => "strobe_started",
            StrobeStart::NotSupportedOrAlreadyStrobing => "not_supported_or_already_strobing",
        }
    }
}

/// Outcome of [`StrobeController::stop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrobeStop {
    Stopped,
}

impl StrobeStop {
    pub fn as_str(self) -> &'static str {
        "strobe_stopped"
    }
}
