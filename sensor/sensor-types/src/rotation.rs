//! Rotation matrix to quaternion conversion.

use nalgebra::{Matrix3, Quaternion, UnitQuaternion};

use crate::error::{Result, SensorError};

/// Tolerance on `RᵀR = I` and `det R = 1` accepted as a rotation.
pub const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

/// Converts a rotation matrix to a unit quaternion.
///
/// Uses the four-case method: the largest of the trace and the three diagonal
/// entries picks which quaternion component is recovered from a square root,
/// and the other three follow from off-diagonal sums and differences. The
/// pivot is always at least 1/4 in magnitude, so there is no catastrophic
/// cancellation near 180 degree rotations where the trace approaches -1.
///
/// The result has a non-negative scalar part.
///
/// # Errors
///
/// Returns [`SensorError::NonFinite`] for NaN or infinite entries, and
/// [`SensorError::InvalidRotation`] if the matrix is not orthonormal or is a
/// reflection (within [`ORTHONORMAL_TOLERANCE`]).
///
/// # Example
///
/// ```
/// use sensor_types::quaternion_from_rotation_matrix;
/// use nalgebra::{Rotation3, Vector3};
/// use std::f64::consts::PI;
///
/// let r = Rotation3::from_axis_angle(&Vector3::z_axis(), PI);
/// let q = quaternion_from_rotation_matrix(r.matrix()).unwrap();
/// assert!((q.angle() - PI).abs() < 1e-12);
/// ```
pub fn quaternion_from_rotation_matrix(m: &Matrix3<f64>) -> Result<UnitQuaternion<f64>> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(SensorError::non_finite("rotation matrix"));
    }
    let orthonormality = (m.transpose() * m - Matrix3::identity()).amax();
    if orthonormality > ORTHONORMAL_TOLERANCE {
        return Err(SensorError::invalid_rotation(format!(
            "not orthonormal (max |RᵀR - I| = {orthonormality:.3e})"
        )));
    }
    let det = m.determinant();
    if (det - 1.0).abs() > ORTHONORMAL_TOLERANCE {
        return Err(SensorError::invalid_rotation(format!(
            "determinant {det:.6} is not +1"
        )));
    }

    let (m00, m11, m22) = (m[(0, 0)], m[(1, 1)], m[(2, 2)]);
    let trace = m00 + m11 + m22;

    let (w, x, y, z) = if trace >= m00 && trace >= m11 && trace >= m22 {
        let s = (1.0 + trace).sqrt() * 2.0; // 4w
        (
            0.25 * s,
            (m[(2, 1)] - m[(1, 2)]) / s,
            (m[(0, 2)] - m[(2, 0)]) / s,
            (m[(1, 0)] - m[(0, 1)]) / s,
        )
    } else if m00 >= m11 && m00 >= m22 {
        let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0; // 4x
        (
            (m[(2, 1)] - m[(1, 2)]) / s,
            0.25 * s,
            (m[(0, 1)] + m[(1, 0)]) / s,
            (m[(0, 2)] + m[(2, 0)]) / s,
        )
    } else if m11 >= m22 {
        let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0; // 4y
        (
            (m[(0, 2)] - m[(2, 0)]) / s,
            (m[(0, 1)] + m[(1, 0)]) / s,
            0.25 * s,
            (m[(1, 2)] + m[(2, 1)]) / s,
        )
    } else {
        let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0; // 4z
        (
            (m[(1, 0)] - m[(0, 1)]) / s,
            (m[(0, 2)] + m[(2, 0)]) / s,
            (m[(1, 2)] + m[(2, 1)]) / s,
            0.25 * s,
        )
    };

    let q = if w < 0.0 {
        Quaternion::new(-w, -x, -y, -z)
    } else {
        Quaternion::new(w, x, y, z)
    };
    Ok(UnitQuaternion::from_quaternion(q))
}
