//! Iterative closest point with a shrinking correspondence radius.
//!
//! Each iteration pairs the moved incoming points with their nearest
//! reference points inside the current radius, solves the closed-form
//! rigid transform for those pairs and composes it onto the running
//! estimate. The radius then shrinks toward its floor, so early iterations
//! can pull in far-off geometry and late iterations only see close pairs.

use map_types::RigidTransform;
use nalgebra::Point3;
use slam_spatial::SpatialIndex;
use tracing::{debug, warn};

use crate::config::{MIN_PAIRS_FOR_TRANSFORM, RegistrarConfig};
use crate::correspondence::{find_correspondences, mean_squared_error};
use crate::kabsch::compute_rigid_transform;

/// Outcome of an ICP run.
#[derive(Debug, Clone, PartialEq)]
pub struct IcpOutcome {
    /// Transform mapping incoming points onto the reference.
    pub transform: RigidTransform,
    /// Iterations performed.
    pub iterations: usize,
    /// True if |ΔMSE| fell below the threshold within the budget.
    pub converged: bool,
    /// Mean squared pair distance at the last iteration.
    pub mse: f64,
    /// Radius in effect at the last iteration.
    pub radius: f64,
    /// Pairs found at the last iteration.
    pub correspondences: usize,
}

/// Runs ICP from `initial` until convergence or the iteration budget.
///
/// `index` must have been built over `reference`. Running out of
/// pairs ends the run early without convergence; the estimate reached so
/// far is returned.
#[must_use]
pub fn icp(
    reference: &[Point3<f64>],
    index: &SpatialIndex,
    incoming: &[Point3<f64>],
    initial: RigidTransform,
    config: &RegistrarConfig,
) -> IcpOutcome {
    let mut transform = initial;
    let mut previous_mse = f64::INFINITY;
    let mut outcome = IcpOutcome {
        transform,
        iterations: 0,
        converged: false,
        mse: f64::INFINITY,
        radius: config.radius_at(0),
        correspondences: 0,
    };

    for iteration in 0..config.max_iterations {
        let radius = config.radius_at(iteration);
        let moved: Vec<Point3<f64>> = incoming
            .iter()
            .map(|p| transform.transform_point(p))
            .collect();
        let pairs = find_correspondences(index, &moved, radius);

        outcome.iterations = iteration + 1;
        outcome.radius = radius;
        outcome.correspondences = pairs.len();

        if pairs.len() < MIN_PAIRS_FOR_TRANSFORM {
            warn!(iteration, pairs = pairs.len(), radius, "icp lost correspondences");
            break;
        }
        let mse = mean_squared_error(&pairs).unwrap_or(f64::INFINITY);

        let (source, target): (Vec<Point3<f64>>, Vec<Point3<f64>>) = pairs
            .iter()
            .map(|c| (moved[c.source], reference[c.target]))
            .unzip();
        let step = match compute_rigid_transform(&source, &target) {
            Ok(step) => step,
            Err(error) => {
                warn!(iteration, %error, "icp step failed");
                break;
            }
        };
        transform = step.compose(&transform);
        outcome.transform = transform;
        outcome.mse = mse;

        debug!(iteration, mse, radius, pairs = pairs.len(), "icp step");

        if (previous_mse - mse).abs() < config.convergence_threshold {
            outcome.converged = true;
            break;
        }
        previous_mse = mse;
    }

    outcome
}
