//! Pairwise point-cloud registration and merging.
//!
//! [`Registrar::merge`] aligns an incoming cloud onto a reference cloud with
//! iterative closest point and folds the aligned points into the reference:
//!
//! 1. Both clouds are voxel-downsampled.
//! 2. Correspondences are searched within a radius that shrinks every
//!    iteration, and the closed-form rigid transform for the pairs is
//!    composed onto the estimate ([`compute_rigid_transform`]).
//! 3. ICP stops once the change in mean squared pair distance falls below
//!    a threshold, or the iteration budget runs out.
//! 4. The alignment is scored ([`alignment_quality`]) within an inlier
//!    radius of a few voxel edges and either merged or rejected.
//!
//! Rejection is not an error. The [`RegistrationStatus`] on the result says
//! why, and the reference cloud is returned untouched.
//!
//! # Example
//!
//! ```
//! use map_registration::{Registrar, RegistrarConfig, RegistrationStatus};
//! use map_types::{PointCloud, RigidTransform};
//! use nalgebra::{Point3, Vector3};
//!
//! let points: Vec<_> = (0..50)
//!     .map(|i| {
//!         let t = f64::from(i);
//!         Point3::new((t * 0.9).sin() * 5.0, (t * 1.7).cos() * 5.0, (t * 0.31).sin() * 3.0)
//!     })
//!     .collect();
//! let reference = PointCloud::from_positions(&points);
//! let incoming = reference.transformed(&RigidTransform::from_translation(Vector3::new(0.5, 0.0, 0.0)));
//!
//! let registrar = Registrar::new(RegistrarConfig::default()).unwrap();
//! let result = registrar.merge(&reference, &incoming, None);
//!
//! assert_eq!(result.status, RegistrationStatus::Converged);
//! assert!((result.transform.translation - Vector3::new(-0.5, 0.0, 0.0)).norm() < 1e-6);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod correspondence;
mod error;
#[cfg(test)]
mod fixtures;
mod icp;
mod kabsch;
mod registrar;
mod status;

pub use config::{MIN_PAIRS_FOR_TRANSFORM, RegistrarConfig};
pub use correspondence::{Correspondence, find_correspondences, mean_squared_error};
pub use error::{RegistrationError, Result};
pub use icp::{IcpOutcome, icp};
pub use kabsch::compute_rigid_transform;
pub use registrar::{Registrar, Registration, alignment_quality};
pub use status::RegistrationStatus;

/// Convenient imports.
pub mod prelude {
    pub use crate::{Registrar, RegistrarConfig, Registration, RegistrationError, RegistrationStatus};
}
