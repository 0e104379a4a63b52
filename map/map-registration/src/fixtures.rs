//! Deterministic clouds for tests.

use map_types::PointCloud;
use nalgebra::{Point3, Vector3};

/// Hash-like value in `[0, 1)`, stable across platforms.
pub fn scatter(i: usize, salt: u32) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let v = ((i as f64) * 12.9898 + f64::from(salt) * 78.233).sin() * 43_758.545_3;
    v.fract().abs()
}

/// `n` irregularly scattered points in a cube of edge `extent`.
pub fn scattered(n: usize, extent: f64, salt: u32) -> Vec<Point3<f64>> {
    (0..n)
        .map(|i| {
            Point3::new(
                scatter(3 * i, salt) * extent,
                scatter(3 * i + 1, salt) * extent,
                scatter(3 * i + 2, salt) * extent,
            )
        })
        .collect()
}

/// [`scattered`] as a cloud, shifted by `offset`.
pub fn scattered_cloud(n: usize, extent: f64, salt: u32, offset: Vector3<f64>) -> PointCloud {
    let points: Vec<_> = scattered(n, extent, salt)
        .into_iter()
        .map(|p| p + offset)
        .collect();
    PointCloud::from_positions(&points)
}
