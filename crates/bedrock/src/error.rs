//! Error types for the runtime layer.

use crate::detect::RuntimeKind;

/// Errors from parsing the mode configuration surface.
///
/// An unrecognized mode value is fatal to the surface that parsed it; it is
/// never silently coerced to the real-host default.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The mode string did not match any known mode for the service.
    #[error("unrecognized {service} mode {value:?} (expected one of: {expected})")]
    UnknownMode {
        /// Which service the mode was parsed for (`time`, `random`, `id`).
        service: &'static str,
        /// The rejected value, verbatim.
        value: String,
        /// Human-readable list of accepted values.
        expected: &'static str,
    },
}

/// Errors from host adapter operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The operation has no meaning on the detected runtime kind.
    ///
    /// Surfaced to the caller rather than returning an empty default, so
    /// environment mismatches are never masked.
    #[error("{operation} is not supported on the {kind} runtime")]
    Unsupported {
        /// The runtime kind the operation was attempted on.
        kind: RuntimeKind,
        /// The operation that was attempted.
        operation: &'static str,
    },
}

/// Errors from [`sleep`](crate::services::ClockService::sleep).
///
/// Cancellation travels through the `Result` channel, never across the
/// suspension boundary as a panic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SleepError {
    /// The sleep was aborted before or during its wait.
    #[error("sleep was cancelled before completion")]
    Cancelled,
}

/// Errors from the output sink contract.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The host byte writer failed.
    #[error("write to host sink failed: {source}")]
    Io {
        /// Underlying OS error.
        #[from]
        source: std::io::Error,
    },

    /// The console-style sink (or its pump) rejected the write.
    #[error("host console rejected the write: {reason}")]
    Console {
        /// What the host reported.
        reason: String,
    },
}
