//! The fused state and its covariance layout.

use nalgebra::{Matrix3, SMatrix, SVector, UnitQuaternion, Vector3};
use sensor_types::Pose3d;
use serde::{Deserialize, Serialize};

use crate::config::FusionConfig;

/// Dimension of the estimated state: position, velocity, quaternion.
pub const STATE_DIM: usize = 10;

/// Offset of position in the state vector.
pub const POSITION: usize = 0;
/// Offset of velocity in the state vector.
pub const VELOCITY: usize = 3;
/// Offset of the quaternion `(w, x, y, z)` in the state vector.
pub const ORIENTATION: usize = 6;

/// Covariance over the 10-dimensional state.
pub type StateCovariance = SMatrix<f64, STATE_DIM, STATE_DIM>;
/// Vector over the 10-dimensional state.
pub type StateVector = SVector<f64, STATE_DIM>;

/// Snapshot of the estimator.
///
/// The orientation is a unit quaternion after every update and the
/// covariance is kept symmetric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedState {
    /// World-frame position.
    pub position: Vector3<f64>,
    /// World-frame velocity.
    pub velocity: Vector3<f64>,
    /// Body-to-world orientation.
    pub orientation: UnitQuaternion<f64>,
    /// Covariance over `[position, velocity, quaternion]`.
    pub covariance: StateCovariance,
    /// Time of the last processed measurement, if any.
    pub timestamp: Option<f64>,
}

impl FusedState {
    /// Identity pose at rest with the configured initial uncertainty.
    #[must_use]
    pub fn initial(config: &FusionConfig) -> Self {
        let mut diagonal = StateVector::zeros();
        diagonal
            .fixed_rows_mut::<3>(POSITION)
            .fill(config.initial_position_std.powi(2));
        diagonal
            .fixed_rows_mut::<3>(VELOCITY)
            .fill(config.initial_velocity_std.powi(2));
        diagonal
            .fixed_rows_mut::<4>(ORIENTATION)
            .fill(config.initial_orientation_std.powi(2));

        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            covariance: StateCovariance::from_diagonal(&diagonal),
            timestamp: None,
        }
    }

    /// The fused pose.
    #[must_use]
    pub fn pose(&self) -> Pose3d {
        Pose3d::new(self.position, self.orientation)
    }

    /// Position covariance block.
    #[must_use]
    pub fn position_covariance(&self) -> Matrix3<f64> {
        self.covariance
            .fixed_view::<3, 3>(POSITION, POSITION)
            .into_owned()
    }

    /// Velocity covariance block.
    #[must_use]
    pub fn velocity_covariance(&self) -> Matrix3<f64> {
        self.covariance
            .fixed_view::<3, 3>(VELOCITY, VELOCITY)
            .into_owned()
    }

    /// Trace of the full covariance; a scalar measure of total uncertainty.
    #[must_use]
    pub fn uncertainty(&self) -> f64 {
        self.covariance.trace()
    }

    /// True if every component is finite and the quaternion has unit norm.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.velocity.iter().all(|v| v.is_finite())
            && self.orientation.coords.iter().all(|v| v.is_finite())
            && self.covariance.iter().all(|v| v.is_finite())
    }
}

/// Replaces `p` with `(p + pᵀ) / 2`.
pub(crate) fn symmetrise(p: &mut StateCovariance) {
    *p = (*p + p.transpose()) * 0.5;
}
