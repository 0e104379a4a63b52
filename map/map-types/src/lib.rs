//! Map data types for multi-session mapping.
//!
//! This crate provides:
//! - [`MapPoint`] and [`PointCloud`], with voxel-grid downsampling
//! - [`RigidTransform`] for moving data between frames
//! - [`Trajectory`] and [`Session`] for one capture's output
//!
//! # Example
//!
//! ```
//! use map_types::prelude::*;
//! use nalgebra::{Point3, Vector3};
//!
//! let cloud = PointCloud::from_positions(&[Point3::new(1.0, 2.0, 3.0)]);
//! let shifted = cloud.transformed(&RigidTransform::from_translation(Vector3::new(1.0, 0.0, 0.0)));
//! assert_eq!(shifted.points[0].position, Point3::new(2.0, 2.0, 3.0));
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod cloud;
mod error;
mod point;
mod session;
mod trajectory;
mod transform;

pub use cloud::PointCloud;
pub use error::{MapError, Result};
pub use point::MapPoint;
pub use sensor_types::{Pose3d, StampedPose, TrajectoryRecord};
pub use session::Session;
pub use trajectory::Trajectory;
pub use transform::RigidTransform;

/// Convenient imports.
pub mod prelude {
    pub use crate::{MapError, MapPoint, PointCloud, Pose3d, RigidTransform, Session, Trajectory};
}
