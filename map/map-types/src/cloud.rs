//! Point clouds and voxel downsampling.

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use slam_spatial::VoxelKey;

use crate::error::{MapError, Result};
use crate::point::MapPoint;
use crate::transform::RigidTransform;

/// An ordered collection of map points.
///
/// # Example
///
/// ```
/// use map_types::PointCloud;
/// use nalgebra::Point3;
///
/// let cloud = PointCloud::from_positions(&[
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(0.01, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
/// ]);
/// let reduced = cloud.voxel_downsample(0.1).unwrap();
/// assert_eq!(reduced.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    /// The points.
    pub points: Vec<MapPoint>,
}

impl PointCloud {
    /// An empty cloud.
    #[must_use]
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// An empty cloud with reserved capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// A cloud of bare positions.
    #[must_use]
    pub fn from_positions(positions: &[Point3<f64>]) -> Self {
        positions.iter().copied().map(MapPoint::new).collect()
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if there are no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Appends a point.
    pub fn push(&mut self, point: MapPoint) {
        self.points.push(point);
    }

    /// Appends every point of `other`.
    pub fn extend_from(&mut self, other: &Self) {
        self.points.extend_from_slice(&other.points);
    }

    /// Positions only, in order.
    #[must_use]
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// Index of the first non-finite point, if any.
    #[must_use]
    pub fn first_non_finite(&self) -> Option<usize> {
        self.points.iter().position(|p| !p.is_finite())
    }

    /// Mean position, or `None` when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.points.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self.points.iter().map(|p| p.position.coords).sum();
        Some(Point3::from(sum / self.points.len() as f64))
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` when empty.
    #[must_use]
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.points.first()?.position;
        Some(self.points.iter().skip(1).fold((first, first), |(lo, hi), p| {
            (lo.inf(&p.position), hi.sup(&p.position))
        }))
    }

    /// Applies `transform` to every point in place.
    pub fn transform_in_place(&mut self, transform: &RigidTransform) {
        for p in &mut self.points {
            p.position = transform.transform_point(&p.position);
        }
    }

    /// Returns a transformed copy.
    #[must_use]
    pub fn transformed(&self, transform: &RigidTransform) -> Self {
        let mut out = self.clone();
        out.transform_in_place(transform);
        out
    }

    /// Replaces all points in each occupied voxel by one representative.
    ///
    /// The representative sits at the centroid of its members. Colors and
    /// intensities are averaged over the members that carry them; a voxel
    /// with no colored member has no color. Output is ordered by voxel key,
    /// so the result does not depend on hash iteration order.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidVoxelSize`] for a non-positive or non-finite
    /// size and [`MapError::NonFinitePoint`] if a point has a non-finite
    /// coordinate.
    pub fn voxel_downsample(&self, voxel_size: f64) -> Result<Self> {
        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(MapError::InvalidVoxelSize(voxel_size));
        }

        let mut voxels: HashMap<VoxelKey, VoxelAccumulator> = HashMap::new();
        for (index, point) in self.points.iter().enumerate() {
            if !point.is_finite() {
                return Err(MapError::NonFinitePoint { index });
            }
            let key = VoxelKey::from_point(&point.position, voxel_size)?;
            voxels.entry(key).or_default().add(point);
        }

        let mut cells: Vec<(VoxelKey, VoxelAccumulator)> = voxels.into_iter().collect();
        cells.sort_unstable_by_key(|(key, _)| *key);

        Ok(cells.into_iter().map(|(_, acc)| acc.finish()).collect())
    }
}

#[derive(Default)]
struct VoxelAccumulator {
    position_sum: Vector3<f64>,
    count: usize,
    color_sum: [u32; 3],
    color_count: u32,
    intensity_sum: f64,
    intensity_count: u32,
}

impl VoxelAccumulator {
    fn add(&mut self, point: &MapPoint) {
        self.position_sum += point.position.coords;
        self.count += 1;
        if let Some([r, g, b]) = point.color {
            self.color_sum[0] += u32::from(r);
            self.color_sum[1] += u32::from(g);
            self.color_sum[2] += u32::from(b);
            self.color_count += 1;
        }
        if let Some(intensity) = point.intensity {
            self.intensity_sum += f64::from(intensity);
            self.intensity_count += 1;
        }
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn finish(self) -> MapPoint {
        let position = Point3::from(self.position_sum / self.count as f64);
        let color = (self.color_count > 0).then(|| {
            let avg = |sum: u32| {
                let mean = (f64::from(sum) / f64::from(self.color_count)).round();
                // Mean of u8 values is within u8 range.
                mean.clamp(0.0, 255.0) as u8
            };
            [
                avg(self.color_sum[0]),
                avg(self.color_sum[1]),
                avg(self.color_sum[2]),
            ]
        });
        let intensity = (self.intensity_count > 0)
            .then(|| (self.intensity_sum / f64::from(self.intensity_count)) as f32);
        MapPoint {
            position,
            color,
            intensity,
        }
    }
}

impl FromIterator<MapPoint> for PointCloud {
    fn from_iter<I: IntoIterator<Item = MapPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl Extend<MapPoint> for PointCloud {
    fn extend<I: IntoIterator<Item = MapPoint>>(&mut self, iter: I) {
        self.points.extend(iter);
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a MapPoint;
    type IntoIter = std::slice::Iter<'a, MapPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
