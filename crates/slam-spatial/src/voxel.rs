//! Voxel cell keys.

use nalgebra::Point3;

use crate::error::{Result, SpatialError};

/// Integer coordinates of a cell in a uniform voxel grid.
///
/// Cell `(i, j, k)` covers the half-open box
/// `[i*s, (i+1)*s) x [j*s, (j+1)*s) x [k*s, (k+1)*s)` for voxel size `s`.
/// Keys order lexicographically by `(x, y, z)`, which gives downsampling a
/// deterministic output order.
///
/// # Example
///
/// ```
/// use slam_spatial::VoxelKey;
/// use nalgebra::Point3;
///
/// let key = VoxelKey::from_point(&Point3::new(-0.01, 0.0, 0.99), 0.5).unwrap();
/// assert_eq!(key.as_array(), [-1, 0, 1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelKey {
    /// X cell index.
    pub x: i64,
    /// Y cell index.
    pub y: i64,
    /// Z cell index.
    pub z: i64,
}

impl VoxelKey {
    /// Creates a key from cell indices.
    #[must_use]
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Returns the key of the cell containing `point`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidVoxelSize`] if `voxel_size` is not a
    /// positive finite number, and [`SpatialError::IndexOverflow`] if a
    /// coordinate is non-finite or too far from the origin for an `i64` index.
    pub fn from_point(point: &Point3<f64>, voxel_size: f64) -> Result<Self> {
        if !(voxel_size.is_finite() && voxel_size > 0.0) {
            return Err(SpatialError::InvalidVoxelSize(voxel_size));
        }
        Ok(Self {
            x: cell_index(point.x, voxel_size)?,
            y: cell_index(point.y, voxel_size)?,
            z: cell_index(point.z, voxel_size)?,
        })
    }

    /// Returns the indices as an array.
    #[must_use]
    pub const fn as_array(self) -> [i64; 3] {
        [self.x, self.y, self.z]
    }

    /// Returns the world-space center of this cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(self, voxel_size: f64) -> Point3<f64> {
        Point3::new(
            (self.x as f64 + 0.5) * voxel_size,
            (self.y as f64 + 0.5) * voxel_size,
            (self.z as f64 + 0.5) * voxel_size,
        )
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn cell_index(coordinate: f64, voxel_size: f64) -> Result<i64> {
    let cell = (coordinate / voxel_size).floor();
    // i64::MAX is not exactly representable; stay strictly inside the range.
    if !cell.is_finite() || cell.abs() >= i64::MAX as f64 {
        return Err(SpatialError::IndexOverflow(coordinate));
    }
    Ok(cell as i64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn key_floors_toward_negative_infinity() {
        let key = VoxelKey::from_point(&Point3::new(-0.05, 0.05, 0.0), 0.1).unwrap();
        assert_eq!(key, VoxelKey::new(-1, 0, 0));
    }

    #[test]
    fn points_in_same_cell_share_key() {
        let a = VoxelKey::from_point(&Point3::new(1.01, 2.01, 3.01), 0.5).unwrap();
        let b = VoxelKey::from_point(&Point3::new(1.49, 2.49, 3.49), 0.5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_voxel_size_rejected() {
        let p = Point3::origin();
        assert!(matches!(
            VoxelKey::from_point(&p, 0.0),
            Err(SpatialError::InvalidVoxelSize(_))
        ));
        assert!(VoxelKey::from_point(&p, -1.0).is_err());
        assert!(VoxelKey::from_point(&p, f64::NAN).is_err());
    }

    #[test]
    fn non_finite_coordinate_rejected() {
        let p = Point3::new(f64::INFINITY, 0.0, 0.0);
        assert!(matches!(
            VoxelKey::from_point(&p, 0.1),
            Err(SpatialError::IndexOverflow(_))
        ));
    }

    #[test]
    fn center_lies_inside_cell() {
        let key = VoxelKey::new(2, -3, 0);
        let c = key.center(0.5);
        assert_relative_eq!(c.x, 1.25);
        assert_relative_eq!(c.y, -1.25);
        assert_relative_eq!(c.z, 0.25);
        assert_eq!(VoxelKey::from_point(&c, 0.5).unwrap(), key);
    }

    #[test]
    fn ordering_is_lexicographic() {
        let mut keys = vec![
            VoxelKey::new(1, 0, 0),
            VoxelKey::new(0, 5, 0),
            VoxelKey::new(0, 0, 9),
        ];
        keys.sort();
        assert_eq!(keys[0], VoxelKey::new(0, 0, 9));
        assert_eq!(keys[2], VoxelKey::new(1, 0, 0));
    }
}
