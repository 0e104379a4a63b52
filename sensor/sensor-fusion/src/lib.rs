//! State fusion for a mapping robot.
//!
//! One Kalman-style estimator over a 10-dimensional state (position,
//! velocity, orientation quaternion) fed by three asynchronous streams:
//!
//! - Inertial samples drive the **prediction** step
//! - Visual odometry poses and absolute position fixes are **corrections**
//!
//! # Components
//!
//! - [`StateFuser`] - Lock-guarded estimator shared by concurrent producers
//! - [`FusionFilter`] - The estimator itself, for single-threaded use
//! - [`FusedState`] - Immutable snapshot of the estimate and covariance
//! - [`FusionStatus`] - Per-measurement outcome (applied, rejected, skipped)
//! - [`FusionConfig`] - Noise model, gravity and stream selection
//! - [`MeasurementHistory`], [`FusionStats`] - Diagnostics
//!
//! # Failure Model
//!
//! Ingestion never panics and never returns an error. Non-finite input,
//! out-of-order timestamps and unnormalizable quaternions are rejected;
//! ill-conditioned innovation covariances skip the update. In every case the
//! state is left exactly as it was and the returned [`FusionStatus`] says
//! why.
//!
//! # Example
//!
//! ```
//! use sensor_fusion::{FusionConfig, StateFuser};
//! use nalgebra::{UnitQuaternion, Vector3};
//!
//! let fuser = StateFuser::new(FusionConfig::default()).unwrap();
//!
//! // 1 s of constant yaw rate at 100 Hz
//! for i in 0..=100 {
//!     let t = f64::from(i) * 0.01;
//!     let status = fuser.add_inertial(Vector3::new(0.0, 0.0, 0.5), Vector3::zeros(), t);
//!     assert!(status.is_accepted());
//! }
//! let yaw = fuser.orientation().euler_angles().2;
//! assert!((yaw - 0.5).abs() < 1e-9);
//!
//! // A visual pose pulls the estimate toward the measurement
//! let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.5);
//! let status = fuser.add_visual(Vector3::new(1.0, 0.0, 0.0), q.into_inner(), 1.0);
//! assert!(status.is_applied());
//! assert!(fuser.fused_pose().position.x > 0.5);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod error;
mod filter;
mod fuser;
mod history;
mod kinematics;
mod state;
mod status;

pub use config::{FusionConfig, GRAVITY_Z_UP};
pub use error::{FusionError, Result};
pub use filter::FusionFilter;
pub use fuser::StateFuser;
pub use history::{FusionStats, MeasurementHistory};
pub use state::{
    FusedState, ORIENTATION, POSITION, STATE_DIM, StateCovariance, StateVector, VELOCITY,
};
pub use status::{FusionStatus, RejectReason};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        FusedState, FusionConfig, FusionError, FusionFilter, FusionStats, FusionStatus,
        RejectReason, StateFuser,
    };
}
