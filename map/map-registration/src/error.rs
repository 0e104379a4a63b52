//! Error types for map registration.

use map_types::MapError;
use slam_spatial::SpatialError;
use thiserror::Error;

/// Errors that can occur while configuring or running registration.
///
/// Registration outcomes such as insufficient overlap are not errors; they
/// are reported through [`RegistrationStatus`](crate::RegistrationStatus).
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Paired point sets were empty.
    #[error("cannot estimate a transform from an empty point set")]
    EmptyPointSet,

    /// Paired point sets differed in length.
    #[error("point sets must have equal length: {source_len} vs {target_len}")]
    LengthMismatch {
        /// Number of source points.
        source_len: usize,
        /// Number of target points.
        target_len: usize,
    },

    /// SVD did not produce singular vectors.
    #[error("SVD computation failed during transform estimation")]
    SvdFailed,

    /// A configuration value was out of range.
    #[error("invalid registrar configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed.
    #[error("failed to parse registrar configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Map data was malformed.
    #[error(transparent)]
    Map(#[from] MapError),

    /// Spatial index construction failed.
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

impl RegistrationError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}

/// Result type for registration operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;
