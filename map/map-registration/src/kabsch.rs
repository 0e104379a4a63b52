//! Closed-form least-squares rigid alignment of paired points.

use map_types::RigidTransform;
use nalgebra::{Matrix3, Point3, Rotation3, UnitQuaternion, Vector3};

use crate::error::{RegistrationError, Result};

/// Computes the rigid transform minimizing the mean squared distance between
/// `T(source[i])` and `target[i]`.
///
/// Uses the SVD of the cross-covariance of the centered sets. A reflection
/// in the SVD solution is corrected by flipping the weakest singular axis,
/// so the result is always a proper rotation.
///
/// # Errors
///
/// Returns an error if the sets are empty, differ in length, or SVD fails.
///
/// # Example
///
/// ```
/// use map_registration::compute_rigid_transform;
/// use nalgebra::Point3;
///
/// let source = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(0.0, 0.0, 1.0),
/// ];
/// let target: Vec<_> = source.iter().map(|p| p + nalgebra::Vector3::new(1.0, 2.0, 3.0)).collect();
///
/// let t = compute_rigid_transform(&source, &target).unwrap();
/// assert!((t.transform_point(&source[0]) - target[0]).norm() < 1e-9);
/// ```
pub fn compute_rigid_transform(
    source: &[Point3<f64>],
    target: &[Point3<f64>],
) -> Result<RigidTransform> {
    if source.is_empty() || target.is_empty() {
        return Err(RegistrationError::EmptyPointSet);
    }
    if source.len() != target.len() {
        return Err(RegistrationError::LengthMismatch {
            source_len: source.len(),
            target_len: target.len(),
        });
    }

    let source_centroid = centroid(source);
    let target_centroid = centroid(target);

    let mut h = Matrix3::zeros();
    for (s, t) in source.iter().zip(target) {
        h += (s.coords - source_centroid) * (t.coords - target_centroid).transpose();
    }

    let svd = h.svd(true, true);
    let u = svd.u.ok_or(RegistrationError::SvdFailed)?;
    let v = svd.v_t.ok_or(RegistrationError::SvdFailed)?.transpose();

    let mut r = v * u.transpose();
    if r.determinant() < 0.0 {
        // Singular values are sorted, so column 2 is the weakest axis.
        let mut v = v;
        v.column_mut(2).neg_mut();
        r = v * u.transpose();
    }

    let rotation = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
    let translation = target_centroid - rotation * source_centroid;
    Ok(RigidTransform::new(rotation, translation))
}

#[allow(clippy::cast_precision_loss)]
fn centroid(points: &[Point3<f64>]) -> Vector3<f64> {
    points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / points.len() as f64
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    fn tetra() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(1.0, 1.0, 1.0),
        ]
    }

    #[test]
    fn identity_for_equal_sets() {
        let pts = tetra();
        let t = compute_rigid_transform(&pts, &pts).unwrap();
        assert!(t.is_identity(1e-9));
    }

    #[test]
    fn recovers_rotation_and_translation() {
        let truth = RigidTransform::new(
            UnitQuaternion::from_euler_angles(0.1, -0.2, FRAC_PI_4),
            Vector3::new(-3.0, 0.5, 7.0),
        );
        let source = tetra();
        let target: Vec<_> = source.iter().map(|p| truth.transform_point(p)).collect();

        let t = compute_rigid_transform(&source, &target).unwrap();
        assert_relative_eq!(t.translation, truth.translation, epsilon = 1e-9);
        assert!(t.rotation.angle_to(&truth.rotation) < 1e-6);
    }

    #[test]
    fn mirrored_target_still_yields_proper_rotation() {
        let source = tetra();
        let target: Vec<_> = source.iter().map(|p| Point3::new(-p.x, p.y, p.z)).collect();
        let t = compute_rigid_transform(&source, &target).unwrap();
        assert_relative_eq!(
            t.rotation.to_rotation_matrix().matrix().determinant(),
            1.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            compute_rigid_transform(&[], &[]),
            Err(RegistrationError::EmptyPointSet)
        ));
        let pts = tetra();
        assert!(matches!(
            compute_rigid_transform(&pts, &pts[..2]),
            Err(RegistrationError::LengthMismatch { source_len: 5, target_len: 2 })
        ));
    }
}
