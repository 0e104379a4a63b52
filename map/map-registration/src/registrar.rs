//! Pairwise registration and merging of point clouds.

use map_types::{MapError, PointCloud, RigidTransform};
use nalgebra::Point3;
use slam_spatial::SpatialIndex;
use tracing::{debug, info, warn};

use crate::config::RegistrarConfig;
use crate::correspondence::find_correspondences;
use crate::error::Result;
use crate::icp::icp;
use crate::status::RegistrationStatus;

/// Result of [`Registrar::merge`].
#[derive(Debug, Clone)]
pub struct Registration {
    /// The merged cloud, or the reference unchanged if registration failed.
    pub merged: PointCloud,
    /// Transform from the incoming cloud's frame into the reference frame.
    pub transform: RigidTransform,
    /// Alignment quality: 0 is perfect, larger is worse.
    pub quality: f64,
    /// How the attempt ended.
    pub status: RegistrationStatus,
    /// ICP iterations performed.
    pub iterations: usize,
    /// Incoming points matched within the inlier radius at the final transform.
    pub correspondences: usize,
}

impl Registration {
    /// True only if the transform may be trusted.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.status.is_valid()
    }

    fn failed(reference: &PointCloud, status: RegistrationStatus) -> Self {
        Self {
            merged: reference.clone(),
            transform: RigidTransform::identity(),
            quality: f64::INFINITY,
            status,
            iterations: 0,
            correspondences: 0,
        }
    }
}

/// Aligns an incoming cloud onto a reference cloud and merges them.
///
/// # Example
///
/// ```
/// use map_registration::{Registrar, RegistrarConfig};
/// use map_types::PointCloud;
/// use nalgebra::Point3;
///
/// let points: Vec<_> = (0..40)
///     .map(|i| {
///         let t = f64::from(i);
///         Point3::new((t * 1.3).sin() * 4.0, (t * 0.7).cos() * 3.0, (t * 2.1).sin() * 2.0)
///     })
///     .collect();
/// let cloud = PointCloud::from_positions(&points);
///
/// let registrar = Registrar::new(RegistrarConfig::default()).unwrap();
/// let result = registrar.merge(&cloud, &cloud, None);
/// assert!(result.is_valid());
/// assert!(result.transform.is_identity(1e-6));
/// ```
#[derive(Debug, Clone)]
pub struct Registrar {
    config: RegistrarConfig,
}

impl Registrar {
    /// Creates a registrar.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: RegistrarConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &RegistrarConfig {
        &self.config
    }

    /// Registers `incoming` onto `reference` and merges the aligned result.
    ///
    /// Both clouds are voxel-downsampled before ICP. On success the full
    /// incoming cloud is moved into the reference frame, concatenated with
    /// the reference and downsampled again.
    ///
    /// The quality score is taken at the configured inlier radius, a few
    /// voxel edges, so two unrelated clouds that ICP drags on top of each
    /// other still score as mostly unmatched.
    ///
    /// Failures never modify the reference: `merged` is a copy of it. The
    /// transform is identity, except after non-convergence with an
    /// acceptable score, where it is the best estimate reached.
    pub fn merge(
        &self,
        reference: &PointCloud,
        incoming: &PointCloud,
        initial_guess: Option<&RigidTransform>,
    ) -> Registration {
        if reference.is_empty() || incoming.is_empty() {
            warn!(
                reference = reference.len(),
                incoming = incoming.len(),
                "registration skipped: empty cloud"
            );
            return Registration::failed(reference, RegistrationStatus::EmptyCloud);
        }

        match self.try_merge(reference, incoming, initial_guess.copied().unwrap_or_default()) {
            Ok(registration) => registration,
            Err(error) => {
                warn!(%error, "registration skipped: invalid input");
                Registration::failed(
                    reference,
                    RegistrationStatus::InvalidInput {
                        reason: error.to_string(),
                    },
                )
            }
        }
    }

    fn try_merge(
        &self,
        reference: &PointCloud,
        incoming: &PointCloud,
        guess: RigidTransform,
    ) -> Result<Registration> {
        if !guess.is_finite() {
            return Err(MapError::invalid_transform("initial guess is not finite").into());
        }
        let config = &self.config;

        let reference_points = reference.voxel_downsample(config.voxel_size)?.positions();
        let incoming_points = incoming.voxel_downsample(config.voxel_size)?.positions();
        let index = SpatialIndex::build(&reference_points)?;

        let moved: Vec<Point3<f64>> = incoming_points
            .iter()
            .map(|p| guess.transform_point(p))
            .collect();
        let found = find_correspondences(&index, &moved, config.initial_correspondence_distance).len();
        if found < config.min_correspondences {
            warn!(found, required = config.min_correspondences, "registration rejected: insufficient overlap");
            return Ok(Registration::failed(
                reference,
                RegistrationStatus::InsufficientOverlap {
                    found,
                    required: config.min_correspondences,
                },
            ));
        }

        let outcome = icp(&reference_points, &index, &incoming_points, guess, config);
        let (quality, correspondences) = alignment_quality(
            &index,
            &incoming_points,
            &outcome.transform,
            config.inlier_distance(),
        );
        debug!(
            iterations = outcome.iterations,
            converged = outcome.converged,
            mse = outcome.mse,
            quality,
            "icp finished"
        );

        // A failing score rejects the estimate whether or not ICP settled.
        if quality > config.max_quality {
            warn!(
                quality,
                max_quality = config.max_quality,
                converged = outcome.converged,
                "registration rejected: poor quality"
            );
            return Ok(Registration {
                quality,
                iterations: outcome.iterations,
                correspondences,
                ..Registration::failed(reference, RegistrationStatus::QualityRejected { quality })
            });
        }

        if !outcome.converged {
            warn!(iterations = outcome.iterations, quality, "registration did not converge");
            return Ok(Registration {
                merged: reference.clone(),
                transform: outcome.transform,
                quality,
                status: RegistrationStatus::DidNotConverge,
                iterations: outcome.iterations,
                correspondences,
            });
        }

        let mut merged = reference.clone();
        merged.extend_from(&incoming.transformed(&outcome.transform));
        let merged = merged.voxel_downsample(config.voxel_size)?;

        info!(
            iterations = outcome.iterations,
            quality,
            points = merged.len(),
            "registration converged"
        );
        Ok(Registration {
            merged,
            transform: outcome.transform,
            quality,
            status: RegistrationStatus::Converged,
            iterations: outcome.iterations,
            correspondences,
        })
    }
}

/// Scores an alignment as the worse of mean pair distance and the fraction
/// of incoming points with no reference point within `radius`.
///
/// Returns the score and the number of matched points. With no matches the
/// score is 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn alignment_quality(
    index: &SpatialIndex,
    incoming: &[Point3<f64>],
    transform: &RigidTransform,
    radius: f64,
) -> (f64, usize) {
    if incoming.is_empty() {
        return (1.0, 0);
    }
    let moved: Vec<Point3<f64>> = incoming.iter().map(|p| transform.transform_point(p)).collect();
    let pairs = find_correspondences(index, &moved, radius);
    let matched = pairs.len();
    let mean_distance = if matched == 0 {
        0.0
    } else {
        pairs.iter().map(|c| c.distance_sq.sqrt()).sum::<f64>() / matched as f64
    };
    let unmatched = 1.0 - matched as f64 / incoming.len() as f64;
    (mean_distance.max(unmatched), matched)
}
