//! Poses and trajectory records.

use nalgebra::{Isometry3, Matrix4, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorError};
use crate::measurement::MIN_QUATERNION_NORM;
use crate::rotation::quaternion_from_rotation_matrix;

/// A 3D pose (position + orientation).
///
/// Maps body-frame coordinates into the world frame: `p_world = R * p_body + t`.
///
/// # Example
///
/// ```
/// use sensor_types::Pose3d;
/// use nalgebra::{Point3, Vector3};
///
/// let pose = Pose3d::from_translation(Vector3::new(1.0, 2.0, 3.0));
/// let p = pose.transform_point(&Point3::origin());
/// assert_eq!(p, Point3::new(1.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose3d {
    /// Position in meters.
    pub position: Vector3<f64>,
    /// Orientation.
    pub orientation: UnitQuaternion<f64>,
}

impl Pose3d {
    /// Creates a new pose.
    #[must_use]
    pub const fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// The identity pose.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), UnitQuaternion::identity())
    }

    /// A pose with translation only.
    #[must_use]
    pub fn from_translation(position: Vector3<f64>) -> Self {
        Self::new(position, UnitQuaternion::identity())
    }

    /// Creates a pose from a 4x4 homogeneous matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the rotation block is not a proper rotation or the
    /// translation is non-finite.
    pub fn from_matrix(matrix: &Matrix4<f64>) -> Result<Self> {
        let rotation = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let position = Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
        if !position.iter().all(|v| v.is_finite()) {
            return Err(SensorError::non_finite("pose translation"));
        }
        Ok(Self::new(position, quaternion_from_rotation_matrix(&rotation)?))
    }

    /// Returns the 4x4 homogeneous matrix of this pose.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix4<f64> {
        self.to_isometry().to_homogeneous()
    }

    /// Returns the pose as an isometry.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation)
    }

    /// Maps a body-frame point into the world frame.
    #[must_use]
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.orientation * point + self.position
    }
}

impl Default for Pose3d {
    fn default() -> Self {
        Self::identity()
    }
}

/// A pose with the time it was estimated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StampedPose {
    /// Time in seconds.
    pub timestamp: f64,
    /// The pose.
    pub pose: Pose3d,
}

impl StampedPose {
    /// Creates a stamped pose.
    #[must_use]
    pub const fn new(timestamp: f64, pose: Pose3d) -> Self {
        Self { timestamp, pose }
    }
}

/// One line of a persisted trajectory: `(timestamp, position, orientation)`.
///
/// Orientation is stored as `[w, x, y, z]`. This is the flat, format-neutral
/// record downstream writers serialize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    /// Time in seconds.
    pub timestamp: f64,
    /// Position `[x, y, z]`.
    pub position: [f64; 3],
    /// Orientation `[w, x, y, z]`.
    pub orientation: [f64; 4],
}

impl From<&StampedPose> for TrajectoryRecord {
    fn from(stamped: &StampedPose) -> Self {
        let p = stamped.pose.position;
        let q = stamped.pose.orientation;
        Self {
            timestamp: stamped.timestamp,
            position: [p.x, p.y, p.z],
            orientation: [q.w, q.i, q.j, q.k],
        }
    }
}

impl TryFrom<&TrajectoryRecord> for StampedPose {
    type Error = SensorError;

    fn try_from(record: &TrajectoryRecord) -> Result<Self> {
        let [w, x, y, z] = record.orientation;
        let q = Quaternion::new(w, x, y, z);
        let norm = q.norm();
        if !norm.is_finite() || norm < MIN_QUATERNION_NORM {
            return Err(SensorError::degenerate_quaternion(norm));
        }
        let position = Vector3::from(record.position);
        if !record.timestamp.is_finite() || !position.iter().all(|v| v.is_finite()) {
            return Err(SensorError::non_finite("trajectory record"));
        }
        Ok(Self::new(
            record.timestamp,
            Pose3d::new(position, UnitQuaternion::from_quaternion(q)),
        ))
    }
}
