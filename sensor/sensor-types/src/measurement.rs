//! Timestamped measurements pushed into the state fuser.
//!
//! Timestamps are seconds on a clock shared by all streams. Measurements are
//! plain values; validation (finite inputs, normalizable quaternions) happens
//! where they are consumed so that a bad sample is rejected without aborting
//! the producer.

use nalgebra::{Matrix3, Matrix4, Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorError};
use crate::rotation::quaternion_from_rotation_matrix;
use crate::stream::SensorStream;

/// Quaternions shorter than this are treated as non-normalizable.
pub const MIN_QUATERNION_NORM: f64 = 1e-9;

/// A gyroscope + accelerometer sample in the body frame.
///
/// # Units
///
/// - Angular velocity: rad/s
/// - Linear acceleration: m/s²
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InertialSample {
    /// Sample time in seconds.
    pub timestamp: f64,
    /// Body-frame angular velocity.
    pub angular_velocity: Vector3<f64>,
    /// Body-frame linear acceleration.
    pub linear_acceleration: Vector3<f64>,
}

impl InertialSample {
    /// Creates a new inertial sample.
    #[must_use]
    pub const fn new(
        timestamp: f64,
        angular_velocity: Vector3<f64>,
        linear_acceleration: Vector3<f64>,
    ) -> Self {
        Self {
            timestamp,
            angular_velocity,
            linear_acceleration,
        }
    }

    /// True if the timestamp and both vectors are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.timestamp.is_finite()
            && self.angular_velocity.iter().all(|v| v.is_finite())
            && self.linear_acceleration.iter().all(|v| v.is_finite())
    }
}

/// A pose estimate from an independent visual odometry pipeline.
///
/// The orientation is kept exactly as received; it need not be unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisualPose {
    /// Estimate time in seconds.
    pub timestamp: f64,
    /// Estimated position.
    pub position: Vector3<f64>,
    /// Estimated orientation, possibly unnormalized.
    pub orientation: Quaternion<f64>,
}

impl VisualPose {
    /// Creates a new visual pose.
    #[must_use]
    pub const fn new(timestamp: f64, position: Vector3<f64>, orientation: Quaternion<f64>) -> Self {
        Self {
            timestamp,
            position,
            orientation,
        }
    }

    /// Creates a visual pose from a 4x4 homogeneous camera pose.
    ///
    /// # Errors
    ///
    /// Returns an error if the upper-left 3x3 block is not a rotation or the
    /// translation column is non-finite.
    ///
    /// # Example
    ///
    /// ```
    /// use sensor_types::VisualPose;
    /// use nalgebra::Matrix4;
    ///
    /// let mut m = Matrix4::identity();
    /// m[(0, 3)] = 2.0;
    /// let pose = VisualPose::from_matrix(0.5, &m).unwrap();
    /// assert_eq!(pose.position.x, 2.0);
    /// assert_eq!(pose.orientation.w, 1.0);
    /// ```
    pub fn from_matrix(timestamp: f64, matrix: &Matrix4<f64>) -> Result<Self> {
        let rotation: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let position = Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
        if !position.iter().all(|v| v.is_finite()) {
            return Err(SensorError::non_finite("pose translation"));
        }
        let orientation = quaternion_from_rotation_matrix(&rotation)?;
        Ok(Self::new(timestamp, position, orientation.into_inner()))
    }

    /// True if the timestamp, position and quaternion are all finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.timestamp.is_finite()
            && self.position.iter().all(|v| v.is_finite())
            && self.orientation.coords.iter().all(|v| v.is_finite())
    }

    /// Returns the normalized orientation.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::DegenerateQuaternion`] if the quaternion is
    /// non-finite or shorter than [`MIN_QUATERNION_NORM`].
    pub fn unit_orientation(&self) -> Result<UnitQuaternion<f64>> {
        let norm = self.orientation.norm();
        if !norm.is_finite() || norm < MIN_QUATERNION_NORM {
            return Err(SensorError::degenerate_quaternion(norm));
        }
        Ok(UnitQuaternion::from_quaternion(self.orientation))
    }
}

/// An absolute position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    /// Fix time in seconds.
    pub timestamp: f64,
    /// Position in the world frame.
    pub position: Vector3<f64>,
}

impl PositionFix {
    /// Creates a new position fix.
    #[must_use]
    pub const fn new(timestamp: f64, position: Vector3<f64>) -> Self {
        Self {
            timestamp,
            position,
        }
    }

    /// True if the timestamp and position are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.timestamp.is_finite() && self.position.iter().all(|v| v.is_finite())
    }
}

/// Any measurement the fuser accepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stream", rename_all = "snake_case")]
pub enum Measurement {
    /// Prediction input.
    Inertial(InertialSample),
    /// Full-pose correction.
    VisualOdometry(VisualPose),
    /// Position-only correction.
    AbsolutePosition(PositionFix),
}

impl Measurement {
    /// Measurement time in seconds.
    #[must_use]
    pub const fn timestamp(&self) -> f64 {
        match self {
            Self::Inertial(m) => m.timestamp,
            Self::VisualOdometry(m) => m.timestamp,
            Self::AbsolutePosition(m) => m.timestamp,
        }
    }

    /// The stream this measurement belongs to.
    #[must_use]
    pub const fn stream(&self) -> SensorStream {
        match self {
            Self::Inertial(_) => SensorStream::Inertial,
            Self::VisualOdometry(_) => SensorStream::VisualOdometry,
            Self::AbsolutePosition(_) => SensorStream::AbsolutePosition,
        }
    }

    /// True if every scalar in the measurement is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Inertial(m) => m.is_finite(),
            Self::VisualOdometry(m) => m.is_finite(),
            Self::AbsolutePosition(m) => m.is_finite(),
        }
    }
}

impl From<InertialSample> for Measurement {
    fn from(m: InertialSample) -> Self {
        Self::Inertial(m)
    }
}

impl From<VisualPose> for Measurement {
    fn from(m: VisualPose) -> Self {
        Self::VisualOdometry(m)
    }
}

impl From<PositionFix> for Measurement {
    fn from(m: PositionFix) -> Self {
        Self::AbsolutePosition(m)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn inertial_finite_check() {
        let ok = InertialSample::new(0.0, Vector3::zeros(), Vector3::zeros());
        assert!(ok.is_finite());
        let bad = InertialSample::new(0.0, Vector3::new(f64::NAN, 0.0, 0.0), Vector3::zeros());
        assert!(!bad.is_finite());
        let bad_time = InertialSample::new(f64::INFINITY, Vector3::zeros(), Vector3::zeros());
        assert!(!bad_time.is_finite());
    }

    #[test]
    fn visual_unit_orientation_normalizes() {
        let pose = VisualPose::new(1.0, Vector3::zeros(), Quaternion::new(2.0, 0.0, 0.0, 0.0));
        let q = pose.unit_orientation().unwrap();
        assert_relative_eq!(q.w, 1.0);
    }

    #[test]
    fn visual_zero_quaternion_rejected() {
        let pose = VisualPose::new(1.0, Vector3::zeros(), Quaternion::new(0.0, 0.0, 0.0, 0.0));
        assert!(matches!(
            pose.unit_orientation(),
            Err(SensorError::DegenerateQuaternion { .. })
        ));
    }

    #[test]
    fn visual_from_matrix() {
        let r = Rotation3::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(r.matrix());
        m[(0, 3)] = 1.0;
        m[(1, 3)] = -2.0;
        m[(2, 3)] = 0.5;

        let pose = VisualPose::from_matrix(3.0, &m).unwrap();
        assert_relative_eq!(pose.position, Vector3::new(1.0, -2.0, 0.5));
        let q = pose.unit_orientation().unwrap();
        assert_relative_eq!(q.angle(), FRAC_PI_2, epsilon = 1e-12);
        assert_eq!(pose.timestamp, 3.0);
    }

    #[test]
    fn visual_from_matrix_rejects_bad_rotation() {
        let mut m = Matrix4::identity();
        m[(0, 0)] = 3.0;
        assert!(VisualPose::from_matrix(0.0, &m).is_err());
    }

    #[test]
    fn measurement_dispatch() {
        let m: Measurement = PositionFix::new(4.0, Vector3::new(1.0, 2.0, 3.0)).into();
        assert_eq!(m.stream(), SensorStream::AbsolutePosition);
        assert_eq!(m.timestamp(), 4.0);
        assert!(m.is_finite());

        let m: Measurement = InertialSample::new(1.5, Vector3::z(), Vector3::zeros()).into();
        assert_eq!(m.stream(), SensorStream::Inertial);
    }

    #[test]
    fn measurement_serde_tagged() {
        let m: Measurement = PositionFix::new(4.0, Vector3::new(1.0, 2.0, 3.0)).into();
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"stream\":\"absolute_position\""));
        let back: Measurement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
