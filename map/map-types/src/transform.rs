//! Rigid transforms between map frames.

use nalgebra::{Isometry3, Matrix4, Point3, Translation3, UnitQuaternion, Vector3};
use sensor_types::quaternion_from_rotation_matrix;
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

/// Tolerance on the bottom row of a homogeneous matrix.
const HOMOGENEOUS_TOLERANCE: f64 = 1e-9;

/// A rotation followed by a translation: `p' = R p + t`.
///
/// Registration produces transforms mapping a session's native frame into
/// the global frame.
///
/// # Example
///
/// ```
/// use map_types::RigidTransform;
/// use nalgebra::{Point3, UnitQuaternion, Vector3};
/// use std::f64::consts::FRAC_PI_2;
///
/// let t = RigidTransform::new(
///     UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
///     Vector3::new(1.0, 0.0, 0.0),
/// );
/// let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert!((p - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
///
/// let back = t.inverse().transform_point(&p);
/// assert!((back - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    /// Rotation.
    pub rotation: UnitQuaternion<f64>,
    /// Translation, applied after rotation.
    pub translation: Vector3<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    /// Creates a transform from rotation and translation.
    #[must_use]
    pub const fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(UnitQuaternion::identity(), Vector3::zeros())
    }

    /// A pure translation.
    #[must_use]
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self::new(UnitQuaternion::identity(), translation)
    }

    /// A pure rotation about the origin.
    #[must_use]
    pub fn from_rotation(rotation: UnitQuaternion<f64>) -> Self {
        Self::new(rotation, Vector3::zeros())
    }

    /// Parses a 4x4 homogeneous matrix.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidTransform`] if the bottom row is not
    /// `[0, 0, 0, 1]`, the translation is non-finite, or the rotation block
    /// is not a proper rotation.
    pub fn from_matrix4(matrix: &Matrix4<f64>) -> Result<Self> {
        let bottom = [matrix[(3, 0)], matrix[(3, 1)], matrix[(3, 2)], matrix[(3, 3)] - 1.0];
        if !bottom.iter().all(|v| v.abs() <= HOMOGENEOUS_TOLERANCE) {
            return Err(MapError::invalid_transform(
                "bottom row must be [0, 0, 0, 1]",
            ));
        }
        let translation = Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
        if !translation.iter().all(|v| v.is_finite()) {
            return Err(MapError::invalid_transform("non-finite translation"));
        }
        let block = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let rotation = quaternion_from_rotation_matrix(&block)
            .map_err(|e| MapError::invalid_transform(e.to_string()))?;
        Ok(Self::new(rotation, translation))
    }

    /// The 4x4 homogeneous matrix.
    #[must_use]
    pub fn to_matrix4(&self) -> Matrix4<f64> {
        self.to_isometry().to_homogeneous()
    }

    /// The transform as an isometry.
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation)
    }

    /// Applies the transform to a point.
    #[must_use]
    pub fn transform_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }

    /// Rotates a direction; translation does not apply.
    #[must_use]
    pub fn transform_vector(&self, vector: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * vector
    }

    /// `self ∘ other`: applies `other` first, then `self`.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self::new(
            self.rotation * other.rotation,
            self.translation + self.rotation * other.translation,
        )
    }

    /// The inverse transform.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self::new(rotation, -(rotation * self.translation))
    }

    /// Rotation angle in radians.
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.rotation.angle()
    }

    /// True if rotation angle and translation norm are both below `epsilon`.
    #[must_use]
    pub fn is_identity(&self, epsilon: f64) -> bool {
        self.rotation.angle() < epsilon && self.translation.norm() < epsilon
    }

    /// True if every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.rotation.coords.iter().all(|v| v.is_finite())
            && self.translation.iter().all(|v| v.is_finite())
    }
}
