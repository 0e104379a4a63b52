//! Error types for map data.

use slam_spatial::SpatialError;
use thiserror::Error;

/// Errors that can occur when building or converting map data.
#[derive(Debug, Error)]
pub enum MapError {
    /// Voxel size must be positive and finite.
    #[error("voxel size must be positive and finite, got {0}")]
    InvalidVoxelSize(f64),

    /// A point had a NaN or infinite coordinate.
    #[error("point {index} has a non-finite coordinate")]
    NonFinitePoint {
        /// Index of the offending point.
        index: usize,
    },

    /// A homogeneous matrix did not describe a rigid transform.
    #[error("invalid transform matrix: {0}")]
    InvalidTransform(String),

    /// Spatial bucketing failed.
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

impl MapError {
    /// Creates an invalid transform error.
    #[must_use]
    pub fn invalid_transform(reason: impl Into<String>) -> Self {
        Self::InvalidTransform(reason.into())
    }
}

/// Result type for map operations.
pub type Result<T> = std::result::Result<T, MapError>;
