//! Error types for spatial operations.

/// Errors that can occur during spatial operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SpatialError {
    /// The voxel size must be positive and finite.
    #[error("voxel size must be positive and finite, got {0}")]
    InvalidVoxelSize(f64),

    /// A point had a NaN or infinite coordinate.
    #[error("point {index} has a non-finite coordinate")]
    NonFinitePoint {
        /// Index of the offending point in the input slice.
        index: usize,
    },

    /// The cell index does not fit the key's integer range.
    #[error("voxel index overflow for coordinate {0}")]
    IndexOverflow(f64),

    /// An index cannot be built over zero points.
    #[error("cannot build a spatial index over an empty point set")]
    EmptyPointSet,

    /// Too many distinct points share one coordinate in the index frame.
    #[error("{count} points share one coordinate on index axis {axis}")]
    DegenerateAxis {
        /// Axis of the index frame.
        axis: usize,
        /// Number of points sharing the value.
        count: usize,
    },
}

/// Result type for spatial operations.
pub type Result<T> = std::result::Result<T, SpatialError>;
