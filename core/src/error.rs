//! Error taxonomy for alert hardware
//!
//! Failures while starting are returned to the caller. Failures inside an
//! already running session terminate that session and are only logged.

use crate::output::SinkPurpose;

/// Broad classification of an [`AlertError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A device or channel could not be opened
    Init,
    /// A write or torch command failed during an active session
    Io,
    /// The host denied access to a capability
    Permission,
}

/// Errors raised by the siren, the strobe and their host adapters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlertError {
    /// Audio output for the given purpose could not be opened
    #[error("failed to open {purpose} output: {reason}")]
    InitFailure {
        purpose: SinkPurpose,
        reason: String,
    },

    /// Torch or other non-audio capability could not be initialized
    #[error("failed to initialize {0}")]
    CapabilityInit(String),

    /// Device was reconfigured, disconnected or rejected a command
    #[error("I/O failure: {0}")]
    IoFailure(String),

    /// Host denied access to a capability
    #[error("permission denied: {0}")]
    PermissionFailure(String),
}

impl AlertError {
    pub fn init(purpose: SinkPurpose, reason: impl Into<String>) -> Self {
        Self::InitFailure {
            purpose,
            reason: reason.into(),
        }
    }

    pub fn io(reason: impl Into<String>) -> Self {
        Self::IoFailure(reason.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InitFailure { .. } | Self::CapabilityInit(_) => ErrorKind::Init,
            Self::IoFailure(_) => ErrorKind::Io,
            Self::PermissionFailure(_) => ErrorKind::Permission,
        }
    }
}
