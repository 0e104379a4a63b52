//! Measurement and pose types for state estimation.
//!
//! This crate defines the data contracts between capture pipelines and the
//! estimator:
//!
//! - [`Measurement`] - Tagged union of the three measurement streams
//!   - [`InertialSample`] - Angular velocity + linear acceleration
//!   - [`VisualPose`] - Pose estimate from visual odometry
//!   - [`PositionFix`] - Absolute position
//! - [`SensorStream`] - Closed set of stream identifiers
//! - [`Pose3d`], [`StampedPose`], [`TrajectoryRecord`] - Poses and their
//!   persisted form
//! - [`quaternion_from_rotation_matrix`] - Four-case matrix to quaternion
//!   conversion
//!
//! # Layer 0 Crate
//!
//! No estimator or mapping logic lives here, so drivers, simulators and
//! offline tools can share these types without pulling in the fuser.
//!
//! # Time
//!
//! Timestamps are `f64` seconds on a clock shared by every stream. They are
//! deliberately not validated on construction: the fuser rejects a
//! non-finite or out-of-order sample at ingestion and keeps running.
//!
//! # Example
//!
//! ```
//! use sensor_types::{InertialSample, Measurement, SensorStream};
//! use nalgebra::Vector3;
//!
//! let imu = InertialSample::new(
//!     0.01,
//!     Vector3::new(0.0, 0.0, 0.1),
//!     Vector3::zeros(),
//! );
//! let m = Measurement::from(imu);
//!
//! assert_eq!(m.stream(), SensorStream::Inertial);
//! assert!(m.is_finite());
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod frame;
mod measurement;
mod rotation;
mod stream;

pub use error::{Result, SensorError};
pub use frame::{Pose3d, StampedPose, TrajectoryRecord};
pub use measurement::{InertialSample, MIN_QUATERNION_NORM, Measurement, PositionFix, VisualPose};
pub use rotation::{ORTHONORMAL_TOLERANCE, quaternion_from_rotation_matrix};
pub use stream::SensorStream;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        InertialSample, Measurement, Pose3d, PositionFix, SensorError, SensorStream, StampedPose,
        TrajectoryRecord, VisualPose, quaternion_from_rotation_matrix,
    };
}
