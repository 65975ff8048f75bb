//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter directive string failed to parse.
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    /// A global subscriber was already installed.
    #[error("logging already initialized")]
    AlreadyInitialized,
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
