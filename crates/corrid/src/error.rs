//! Error types for correlation operations.

use http::header::{InvalidHeaderName, InvalidHeaderValue};
use thiserror::Error;

/// Result alias for correlation operations.
pub type CorrelationResult<T> = Result<T, CorrelationError>;

/// Errors raised while staging headers or loading configuration.
#[derive(Debug, Error)]
pub enum CorrelationError {
    /// A header name could not be represented on the wire.
    #[error("invalid header name")]
    InvalidHeaderName {
        /// Offending header name.
        header: String,
        /// Underlying header parsing error.
        source: InvalidHeaderName,
    },
    /// A header value could not be represented on the wire.
    #[error("invalid header value")]
    InvalidHeaderValue {
        /// Header the value was destined for.
        header: String,
        /// Underlying header parsing error.
        source: InvalidHeaderValue,
    },
    /// A configuration value was invalid.
    #[error("invalid configuration value")]
    InvalidConfig {
        /// Configuration key that failed validation.
        name: &'static str,
        /// Offending value.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: corrid_telemetry::TelemetryError,
    },
}
