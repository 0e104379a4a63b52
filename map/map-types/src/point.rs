//! Map points.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A point in a map, with optional color and intensity.
///
/// # Example
///
/// ```
/// use map_types::MapPoint;
///
/// let p = MapPoint::from_coords(1.0, 2.0, 3.0).with_color([255, 0, 0]);
/// assert_eq!(p.color, Some([255, 0, 0]));
/// assert!(p.intensity.is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    /// Position.
    pub position: Point3<f64>,
    /// RGB color.
    pub color: Option<[u8; 3]>,
    /// Return intensity.
    pub intensity: Option<f32>,
}

impl MapPoint {
    /// A point with position only.
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            color: None,
            intensity: None,
        }
    }

    /// A point from coordinates.
    #[must_use]
    pub const fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Sets the color.
    #[must_use]
    pub const fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = Some(color);
        self
    }

    /// Sets the intensity.
    #[must_use]
    pub const fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = Some(intensity);
        self
    }

    /// True if all coordinates are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
    }
}

impl From<Point3<f64>> for MapPoint {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}
