//! Property-based tests for rotation conversion.
//!
//! Run with: cargo test -p sensor-types -- proptest

use nalgebra::{Rotation3, Unit, UnitQuaternion, Vector3};
use proptest::prelude::*;
use sensor_types::quaternion_from_rotation_matrix;
use std::f64::consts::PI;

/// Generate a non-degenerate rotation axis.
fn arb_axis() -> impl Strategy<Value = Unit<Vector3<f64>>> {
    prop::array::uniform3(-1.0..1.0f64)
        .prop_filter("axis must not be near zero", |[x, y, z]| {
            x * x + y * y + z * z > 1e-4
        })
        .prop_map(|[x, y, z]| Unit::new_normalize(Vector3::new(x, y, z)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn proptest_matrix_to_quaternion_matches_axis_angle(
        axis in arb_axis(),
        angle in -PI..PI,
    ) {
        let expected = UnitQuaternion::from_axis_angle(&axis, angle);
        let matrix = Rotation3::from_axis_angle(&axis, angle);
        let q = quaternion_from_rotation_matrix(matrix.matrix()).unwrap();

        let d = (q.coords - expected.coords).norm().min((q.coords + expected.coords).norm());
        prop_assert!(d < 1e-9, "distance {d}");
        prop_assert!((q.norm() - 1.0).abs() < 1e-12);
        prop_assert!(q.w >= 0.0);
    }

    #[test]
    fn proptest_rotated_vectors_agree(
        axis in arb_axis(),
        angle in -PI..PI,
        v in prop::array::uniform3(-10.0..10.0f64),
    ) {
        let v = Vector3::from(v);
        let matrix = Rotation3::from_axis_angle(&axis, angle);
        let q = quaternion_from_rotation_matrix(matrix.matrix()).unwrap();
        let diff = (q * v - matrix * v).norm();
        prop_assert!(diff < 1e-9, "diff {diff}");
    }
}
