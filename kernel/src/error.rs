//! Kernel-wide error types.
//!
//! Mirrors the teacher's approach of replacing ad hoc `&'static str` errors
//! with a single enum, while keeping only the variants this crate's
//! subsystems actually raise. The term engine's *invariant* violations
//! (full action ring, unknown action tag) are not represented here: per
//! spec.md they are fatal and handled by panicking, not by `Result`.

use core::fmt;

/// Main kernel error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "kernel errors must be handled, not silently discarded"]
pub enum KernelError {
    /// Hardware errors
    HardwareError { device: &'static str, code: u32 },

    /// Generic errors
    InvalidArgument {
        name: &'static str,
        value: &'static str,
    },
    OperationNotSupported {
        operation: &'static str,
    },
    ResourceExhausted {
        resource: &'static str,
    },
    Timeout {
        operation: &'static str,
        duration_ms: u64,
    },
    NotImplemented {
        feature: &'static str,
    },
    /// Subsystem not initialized (called before init())
    NotInitialized {
        subsystem: &'static str,
    },
    /// Legacy string error for gradual migration from &'static str patterns.
    LegacyError {
        message: &'static str,
    },
}

/// Result type alias for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HardwareError { device, code } => {
                write!(f, "Hardware error on {}: code 0x{:x}", device, code)
            }
            Self::InvalidArgument { name, value } => {
                write!(f, "Invalid argument '{}': {}", name, value)
            }
            Self::OperationNotSupported { operation } => {
                write!(f, "Operation not supported: {}", operation)
            }
            Self::ResourceExhausted { resource } => write!(f, "Resource exhausted: {}", resource),
            Self::Timeout {
                operation,
                duration_ms,
            } => write!(f, "Timeout during {}: {} ms", operation, duration_ms),
            Self::NotImplemented { feature } => write!(f, "Feature not implemented: {}", feature),
            Self::NotInitialized { subsystem } => {
                write!(f, "Subsystem not initialized: {}", subsystem)
            }
            Self::LegacyError { message } => write!(f, "{}", message),
        }
    }
}

impl From<&'static str> for KernelError {
    fn from(msg: &'static str) -> Self {
        Self::LegacyError { message: msg }
    }
}

#[macro_export]
macro_rules! kernel_error {
    (InvalidArgument { $name:expr => $value:expr }) => {
        $crate::error::KernelError::InvalidArgument {
            name: $name,
            value: $value,
        }
    };
    ($variant:ident) => {
        $crate::error::KernelError::$variant
    };
}
