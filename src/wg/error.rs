//! Error types for WireGuard device queries
//!
//! Distinguishes the failure modes the poll loop cares about: a missing
//! device is routine (interfaces come and go), a permission problem needs
//! operator attention, anything else is treated as transient.

use thiserror::Error;

/// Errors that can occur while querying or parsing WireGuard device state
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum WgError {
    /// The named device does not currently exist
    #[error("interface '{interface}' not found")]
    InterfaceNotFound { interface: String },

    /// Insufficient privilege to query device state
    #[error("permission denied querying interface '{interface}'")]
    PermissionDenied { interface: String },

    /// The query itself failed (tool missing, timeout, I/O error, ...)
    #[error("querying interface '{interface}' failed: {reason}")]
    QueryFailed { interface: String, reason: String },

    /// Device output could not be parsed
    #[error("malformed device output for '{interface}': {reason}")]
    ParseError { interface: String, reason: String },
}

impl WgError {
    /// Whether the failure is expected to clear on its own by the next tick
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::InterfaceNotFound { .. } | Self::QueryFailed { .. }
        )
    }

    /// Log level appropriate for this failure
    ///
    /// A vanished interface is routine; permission problems persist until an
    /// operator fixes them and deserve a louder signal.
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self {
            Self::InterfaceNotFound { .. } => tracing::Level::DEBUG,
            Self::PermissionDenied { .. } => tracing::Level::ERROR,
            Self::QueryFailed { .. } | Self::ParseError { .. } => tracing::Level::WARN,
        }
    }

    /// The interface this error belongs to
    #[must_use]
    pub fn interface(&self) -> &str {
        match self {
            Self::InterfaceNotFound { interface }
            | Self::PermissionDenied { interface }
            | Self::QueryFailed { interface, .. }
            | Self::ParseError { interface, .. } => interface,
        }
    }
}
