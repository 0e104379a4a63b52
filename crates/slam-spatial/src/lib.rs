//! Spatial primitives for point-cloud mapping.
//!
//! This crate provides the two lookups every registration step leans on:
//!
//! - [`VoxelKey`] - Integer cell coordinates of a uniform voxel grid
//! - [`SpatialIndex`] - KD-tree nearest-neighbour index over a fixed point set
//!
//! # Layer 0 Crate
//!
//! No dependency on the fusion or mapping crates. It can be used by any
//! component that needs cell bucketing or nearest-neighbour queries.
//!
//! # Example
//!
//! ```
//! use slam_spatial::{SpatialIndex, VoxelKey};
//! use nalgebra::Point3;
//!
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 2.0, 0.0),
//! ];
//! let index = SpatialIndex::build(&points).unwrap();
//!
//! let hit = index.nearest(&Point3::new(0.9, 0.1, 0.0)).unwrap();
//! assert_eq!(hit.index, 1);
//!
//! // Nothing within 0.5 of this query
//! assert!(index.nearest_within(&Point3::new(5.0, 5.0, 5.0), 0.5).is_none());
//!
//! let key = VoxelKey::from_point(&Point3::new(0.12, -0.01, 0.5), 0.1).unwrap();
//! assert_eq!(key, VoxelKey::new(1, -1, 5));
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod index;
mod voxel;

pub use error::{Result, SpatialError};
pub use index::{Neighbor, SpatialIndex};
pub use voxel::VoxelKey;

// Re-export nalgebra types for convenience
pub use nalgebra::Point3;
