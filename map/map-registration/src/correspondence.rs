//! Nearest-neighbor correspondences between clouds.

use nalgebra::Point3;
use rayon::prelude::*;
use slam_spatial::SpatialIndex;

/// A pairing of an incoming point with its nearest reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    /// Index into the incoming points.
    pub source: usize,
    /// Index into the reference points.
    pub target: usize,
    /// Squared distance between the pair.
    pub distance_sq: f64,
}

/// Pairs every point with its nearest indexed neighbor within `radius`.
///
/// Points with no neighbor in range are left unpaired. Output is ordered by
/// `source`.
#[must_use]
pub fn find_correspondences(
    index: &SpatialIndex,
    points: &[Point3<f64>],
    radius: f64,
) -> Vec<Correspondence> {
    points
        .par_iter()
        .enumerate()
        .filter_map(|(source, p)| {
            index.nearest_within(p, radius).map(|n| Correspondence {
                source,
                target: n.index,
                distance_sq: n.distance_sq,
            })
        })
        .collect()
}

/// Mean squared distance over `pairs`, or `None` if there are none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_squared_error(pairs: &[Correspondence]) -> Option<f64> {
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.iter().map(|c| c.distance_sq).sum::<f64>() / pairs.len() as f64)
    }
}
