//! Error types for sensor-fusion crate.

use thiserror::Error;

/// Errors that can occur when building a fuser.
///
/// Rejected or skipped measurements are not errors; they are reported as a
/// [`FusionStatus`](crate::FusionStatus).
#[derive(Debug, Error)]
pub enum FusionError {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FusionError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result type for sensor fusion operations.
pub type Result<T> = std::result::Result<T, FusionError>;
