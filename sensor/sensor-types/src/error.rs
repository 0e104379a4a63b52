//! Error types for sensor data.

use thiserror::Error;

/// Errors that can occur when constructing or converting sensor data.
#[derive(Debug, Error)]
pub enum SensorError {
    /// A value that must be finite was NaN or infinite.
    #[error("non-finite value in {0}")]
    NonFinite(String),

    /// A matrix is not a proper rotation (orthonormal with determinant +1).
    #[error("invalid rotation matrix: {0}")]
    InvalidRotation(String),

    /// A quaternion is too close to zero to normalize.
    #[error("degenerate quaternion: norm {norm} cannot be normalized")]
    DegenerateQuaternion {
        /// Norm of the offending quaternion.
        norm: f64,
    },

    /// A stream name that does not match any known sensor stream.
    #[error("unknown sensor stream: {0:?}")]
    UnknownStream(String),
}

impl SensorError {
    /// Creates a non-finite value error.
    #[must_use]
    pub fn non_finite(context: impl Into<String>) -> Self {
        Self::NonFinite(context.into())
    }

    /// Creates an invalid rotation error.
    #[must_use]
    pub fn invalid_rotation(reason: impl Into<String>) -> Self {
        Self::InvalidRotation(reason.into())
    }

    /// Creates a degenerate quaternion error.
    #[must_use]
    pub const fn degenerate_quaternion(norm: f64) -> Self {
        Self::DegenerateQuaternion { norm }
    }

    /// Creates an unknown stream error.
    #[must_use]
    pub fn unknown_stream(name: impl Into<String>) -> Self {
        Self::UnknownStream(name.into())
    }
}

/// Result type for sensor data operations.
pub type Result<T> = std::result::Result<T, SensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_non_finite() {
        let msg = SensorError::non_finite("angular velocity").to_string();
        assert!(msg.contains("non-finite"));
        assert!(msg.contains("angular velocity"));
    }

    #[test]
    fn error_degenerate_quaternion() {
        let msg = SensorError::degenerate_quaternion(0.0).to_string();
        assert!(msg.contains("degenerate quaternion"));
    }

    #[test]
    fn error_unknown_stream() {
        let msg = SensorError::unknown_stream("lidar").to_string();
        assert!(msg.contains("\"lidar\""));
    }

    #[test]
    fn error_invalid_rotation() {
        let msg = SensorError::invalid_rotation("determinant -1").to_string();
        assert!(msg.contains("determinant -1"));
    }
}
