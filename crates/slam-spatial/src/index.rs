//! KD-tree nearest-neighbour index.
//!
//! Wraps a `kiddo` tree built once over a fixed point set. Queries return the
//! position of the match in the original slice, so callers can keep their own
//! per-point attributes alongside.
//!
//! The tree stores every distinct point once, in a fixed rotated frame. Scan
//! data is full of axis-aligned structure (floors, walls, survey grids) whose
//! points share exact coordinate values; in the rotated frame those values
//! spread out, so no leaf bucket fills with items the tree cannot split.
//! Distances are reported from the original coordinates.

use hashbrown::HashMap;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Point3, Rotation3};

use crate::error::{Result, SpatialError};

/// Leaf bucket size of [`kiddo::KdTree`].
const BUCKET_SIZE: usize = 32;

/// Euler angles of the tree frame. Any orientation without small rational
/// direction ratios works.
const TREE_FRAME_ANGLES: (f64, f64, f64) = (0.571_9, 0.913_7, 0.336_1);

/// A nearest-neighbour match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the matched point in the slice the index was built from.
    pub index: usize,
    /// Squared Euclidean distance from the query to the match.
    pub distance_sq: f64,
}

impl Neighbor {
    /// Euclidean distance from the query to the match.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance_sq.sqrt()
    }
}

/// Nearest-neighbour index over a fixed set of 3D points.
///
/// Repeated points are stored once; a query that lands on one reports the
/// first occurrence in the input slice.
pub struct SpatialIndex {
    tree: KdTree<f64, 3>,
    frame: Rotation3<f64>,
    points: Vec<Point3<f64>>,
}

impl SpatialIndex {
    /// Builds an index over `points`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::EmptyPointSet`] for an empty slice,
    /// [`SpatialError::NonFinitePoint`] if any coordinate is NaN or infinite,
    /// and [`SpatialError::DegenerateAxis`] if too many distinct points still
    /// share one coordinate in the tree frame.
    pub fn build(points: &[Point3<f64>]) -> Result<Self> {
        if points.is_empty() {
            return Err(SpatialError::EmptyPointSet);
        }
        if let Some(index) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(SpatialError::NonFinitePoint { index });
        }

        let (roll, pitch, yaw) = TREE_FRAME_ANGLES;
        let frame = Rotation3::from_euler_angles(roll, pitch, yaw);

        let mut seen: HashMap<[u64; 3], usize> = HashMap::with_capacity(points.len());
        let mut entries: Vec<([f64; 3], usize)> = Vec::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            if seen.insert(position_key(p), i).is_none() {
                entries.push((to_tree(&frame, p), i));
            }
        }
        check_axis_spread(&entries)?;

        let mut tree: KdTree<f64, 3> = KdTree::with_capacity(entries.len());
        for (coords, i) in &entries {
            tree.add(coords, *i as u64);
        }

        Ok(Self {
            tree,
            frame,
            points: points.to_vec(),
        })
    }

    /// Number of indexed points, repeats included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; an index is never built over zero points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Finds the closest indexed point to `query`.
    ///
    /// Returns `None` for a non-finite query.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn nearest(&self, query: &Point3<f64>) -> Option<Neighbor> {
        if !(query.x.is_finite() && query.y.is_finite() && query.z.is_finite()) {
            return None;
        }
        let hit = self
            .tree
            .nearest_one::<SquaredEuclidean>(&to_tree(&self.frame, query));
        let index = hit.item as usize;
        let matched = self.points.get(index)?;
        Some(Neighbor {
            index,
            distance_sq: (matched - query).norm_squared(),
        })
    }

    /// Finds the closest indexed point no farther than `max_distance`.
    #[must_use]
    pub fn nearest_within(&self, query: &Point3<f64>, max_distance: f64) -> Option<Neighbor> {
        let max_sq = max_distance * max_distance;
        self.nearest(query).filter(|n| n.distance_sq <= max_sq)
    }
}

/// Bit pattern of a point, with `-0.0` folded into `0.0`.
fn position_key(p: &Point3<f64>) -> [u64; 3] {
    [
        (p.x + 0.0).to_bits(),
        (p.y + 0.0).to_bits(),
        (p.z + 0.0).to_bits(),
    ]
}

fn to_tree(frame: &Rotation3<f64>, p: &Point3<f64>) -> [f64; 3] {
    let r = frame * p;
    [r.x, r.y, r.z]
}

/// A leaf split fails only when a full bucket shares its split value, so
/// fewer than [`BUCKET_SIZE`] items per value on every axis keeps `add` safe.
#[allow(clippy::float_cmp)]
fn check_axis_spread(entries: &[([f64; 3], usize)]) -> Result<()> {
    if entries.len() < BUCKET_SIZE {
        return Ok(());
    }
    let mut values: Vec<f64> = Vec::with_capacity(entries.len());
    for axis in 0..3 {
        values.clear();
        values.extend(entries.iter().map(|(c, _)| c[axis]));
        values.sort_unstable_by(f64::total_cmp);

        let longest = values
            .chunk_by(|a, b| a == b)
            .map(<[f64]>::len)
            .max()
            .unwrap_or(0);
        if longest >= BUCKET_SIZE {
            return Err(SpatialError::DegenerateAxis {
                axis,
                count: longest,
            });
        }
    }
    Ok(())
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.points.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(n: usize, seed: u64) -> Vec<Point3<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                Point3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                )
            })
            .collect()
    }

    #[test]
    fn matches_brute_force() {
        let points = random_points(500, 7);
        let index = SpatialIndex::build(&points).unwrap();
        let queries = random_points(50, 11);

        for q in &queries {
            let hit = index.nearest(q).unwrap();
            let best = points
                .iter()
                .map(|p| (p - q).norm_squared())
                .fold(f64::INFINITY, f64::min);
            assert_relative_eq!(hit.distance_sq, best, epsilon = 1e-12);
            assert_relative_eq!((points[hit.index] - q).norm_squared(), best, epsilon = 1e-12);
        }
    }

    #[test]
    fn exact_hit_has_zero_distance() {
        let points = random_points(64, 3);
        let index = SpatialIndex::build(&points).unwrap();
        let hit = index.nearest(&points[17]).unwrap();
        assert_eq!(hit.index, 17);
        assert_eq!(hit.distance(), 0.0);
    }

    #[test]
    fn nearest_within_respects_radius() {
        let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 0.0, 0.0)];
        let index = SpatialIndex::build(&points).unwrap();
        let q = Point3::new(1.0, 0.0, 0.0);

        assert_eq!(index.nearest_within(&q, 1.0).unwrap().index, 0);
        assert!(index.nearest_within(&q, 0.99).is_none());
    }

    #[test]
    fn empty_set_rejected() {
        assert!(matches!(
            SpatialIndex::build(&[]),
            Err(SpatialError::EmptyPointSet)
        ));
    }

    #[test]
    fn non_finite_point_rejected() {
        let points = vec![Point3::origin(), Point3::new(0.0, f64::NAN, 0.0)];
        assert!(matches!(
            SpatialIndex::build(&points),
            Err(SpatialError::NonFinitePoint { index: 1 })
        ));
    }

    #[test]
    fn non_finite_query_returns_none() {
        let index = SpatialIndex::build(&[Point3::origin()]).unwrap();
        assert!(index.nearest(&Point3::new(f64::NAN, 0.0, 0.0)).is_none());
        assert_eq!(index.len(), 1);
        assert!(!index.is_empty());
    }

    #[allow(clippy::cast_precision_loss)]
    fn floor_grid(side: usize, spacing: f64) -> Vec<Point3<f64>> {
        (0..side * side)
            .map(|i| {
                Point3::new(
                    (i % side) as f64 * spacing,
                    (i / side) as f64 * spacing,
                    0.0,
                )
            })
            .collect()
    }

    fn brute_force_sq(points: &[Point3<f64>], q: &Point3<f64>) -> f64 {
        points
            .iter()
            .map(|p| (p - q).norm_squared())
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn planar_grid_builds_and_queries() {
        let points = floor_grid(20, 0.1);
        let index = SpatialIndex::build(&points).unwrap();
        assert_eq!(index.len(), 400);

        for (i, p) in points.iter().enumerate().step_by(37) {
            let hit = index.nearest(p).unwrap();
            assert_eq!(hit.index, i);
            assert_eq!(hit.distance_sq, 0.0);
        }

        for q in &random_points(40, 5) {
            let q = Point3::new(q.x * 0.1 + 1.0, q.y * 0.1 + 1.0, q.z * 0.05);
            let hit = index.nearest(&q).unwrap();
            let best = brute_force_sq(&points, &q);
            assert_relative_eq!(hit.distance_sq, best, epsilon = 1e-12);
        }
    }

    #[test]
    fn axis_aligned_walls_and_columns_build() {
        // Two walls and a post: long runs of shared x, y and z values.
        let mut points = Vec::new();
        for i in 0..30 {
            for k in 0..30 {
                points.push(Point3::new(0.0, f64::from(i) * 0.1, f64::from(k) * 0.1));
                points.push(Point3::new(f64::from(i) * 0.1, 3.0, f64::from(k) * 0.1));
            }
        }
        for k in 0..100 {
            points.push(Point3::new(1.5, 1.5, f64::from(k) * 0.05));
        }
        let index = SpatialIndex::build(&points).unwrap();

        let q = Point3::new(1.45, 1.52, 2.01);
        let hit = index.nearest(&q).unwrap();
        assert_relative_eq!(hit.distance_sq, brute_force_sq(&points, &q), epsilon = 1e-12);
    }

    #[test]
    fn repeated_points_report_first_occurrence() {
        let mut points = vec![Point3::new(1.0, 2.0, 3.0); 100];
        points.push(Point3::new(-0.0, 0.0, 0.0));
        points.push(Point3::new(0.0, 0.0, 0.0));
        let index = SpatialIndex::build(&points).unwrap();
        assert_eq!(index.len(), 102);

        let hit = index.nearest(&Point3::new(1.0, 2.0, 3.1)).unwrap();
        assert_eq!(hit.index, 0);
        assert_relative_eq!(hit.distance(), 0.1, epsilon = 1e-12);

        assert_eq!(index.nearest(&Point3::origin()).unwrap().index, 100);
    }
}
