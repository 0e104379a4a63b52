//! Quaternion Jacobians used by the prediction and correction models.
//!
//! Quaternions are laid out `(w, x, y, z)` to match the state vector.

use nalgebra::{Matrix3, Matrix4, Quaternion, SMatrix, Vector3};

/// Skew-symmetric matrix with `skew(a) * b = a × b`.
pub(crate) fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// `Ξ(q)` such that `q ⊗ (0, θ/2) = ½ Ξ(q) θ`.
///
/// Maps a small body-frame rotation vector onto the quaternion tangent space
/// at `q`. For unit `q` the columns are orthonormal, so `Ξᵀ` maps back.
pub(crate) fn xi(q: &Quaternion<f64>) -> SMatrix<f64, 4, 3> {
    let (w, x, y, z) = (q.w, q.i, q.j, q.k);
    SMatrix::<f64, 4, 3>::new(
        -x, -y, -z, //
        w, -z, y, //
        z, w, -x, //
        -y, x, w,
    )
}

/// Right-multiplication matrix: `q ⊗ p = right_multiplication(p) * q`.
pub(crate) fn right_multiplication(p: &Quaternion<f64>) -> Matrix4<f64> {
    let (w, x, y, z) = (p.w, p.i, p.j, p.k);
    Matrix4::new(
        w, -x, -y, -z, //
        x, w, z, -y, //
        y, -z, w, x, //
        z, y, -x, w,
    )
}

/// Jacobian of `R(q) a` with respect to the quaternion components.
pub(crate) fn rotation_jacobian(q: &Quaternion<f64>, a: &Vector3<f64>) -> SMatrix<f64, 3, 4> {
    let w = q.w;
    let v = q.imag();

    let d_w = (a * w + v.cross(a)) * 2.0;
    let d_v = (Matrix3::identity() * v.dot(a) + v * a.transpose() - a * v.transpose()
        - skew(a) * w)
        * 2.0;

    let mut j = SMatrix::<f64, 3, 4>::zeros();
    j.set_column(0, &d_w);
    j.fixed_view_mut::<3, 3>(0, 1).copy_from(&d_v);
    j
}

/// Converts a quaternion-space correction at `q` into a body-frame rotation
/// vector.
pub(crate) fn tangent_rotation(q: &Quaternion<f64>, dq: &nalgebra::Vector4<f64>) -> Vector3<f64> {
    xi(q).transpose() * dq * 2.0
}
