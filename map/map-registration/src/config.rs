//! Registrar configuration.

use serde::{Deserialize, Serialize};

use crate::error::{RegistrationError, Result};

/// Fewest pairs that pin down a rigid transform.
pub const MIN_PAIRS_FOR_TRANSFORM: usize = 3;

/// Parameters for downsampling, ICP and the acceptance policy.
///
/// The correspondence radius starts at `initial_correspondence_distance` and
/// is multiplied by `correspondence_decay` after every iteration until it
/// reaches `min_correspondence_distance`.
///
/// # Example
///
/// ```
/// use map_registration::RegistrarConfig;
///
/// let config = RegistrarConfig::default()
///     .with_voxel_size(0.1)
///     .with_max_iterations(50);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrarConfig {
    /// Voxel edge length for downsampling inputs and the merged result (m).
    pub voxel_size: f64,
    /// Correspondence radius at the first iteration (m).
    pub initial_correspondence_distance: f64,
    /// Per-iteration radius multiplier, in `(0, 1]`.
    pub correspondence_decay: f64,
    /// Radius floor (m).
    pub min_correspondence_distance: f64,
    /// Iteration budget.
    pub max_iterations: usize,
    /// Converged once |ΔMSE| between iterations falls below this (m²).
    pub convergence_threshold: f64,
    /// Fewest initial correspondences needed to attempt registration.
    pub min_correspondences: usize,
    /// Registrations with a worse quality score are rejected.
    pub max_quality: f64,
    /// Inlier radius for the quality score, in voxel edges. An incoming
    /// point counts as matched only this close to a reference point.
    pub inlier_voxels: f64,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            voxel_size: 0.05,
            initial_correspondence_distance: 10.0,
            correspondence_decay: 0.8,
            min_correspondence_distance: 0.25,
            max_iterations: 100,
            convergence_threshold: 1e-8,
            min_correspondences: 10,
            max_quality: 0.7,
            inlier_voxels: 2.0,
        }
    }
}

impl RegistrarConfig {
    /// Coarser grid and a smaller budget, for previews.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            voxel_size: 0.1,
            correspondence_decay: 0.6,
            max_iterations: 30,
            convergence_threshold: 1e-6,
            ..Self::default()
        }
    }

    /// Finer grid, tighter convergence and a stricter acceptance bound.
    #[must_use]
    pub fn high_quality() -> Self {
        Self {
            voxel_size: 0.02,
            correspondence_decay: 0.9,
            min_correspondence_distance: 0.1,
            max_iterations: 300,
            convergence_threshold: 1e-10,
            min_correspondences: 30,
            max_quality: 0.5,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON configuration. Missing fields default.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Parse`] for malformed JSON and
    /// [`RegistrationError::InvalidConfig`] if validation fails.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the voxel size.
    #[must_use]
    pub const fn with_voxel_size(mut self, voxel_size: f64) -> Self {
        self.voxel_size = voxel_size;
        self
    }

    /// Sets the radius schedule.
    #[must_use]
    pub const fn with_correspondence_schedule(mut self, initial: f64, decay: f64, min: f64) -> Self {
        self.initial_correspondence_distance = initial;
        self.correspondence_decay = decay;
        self.min_correspondence_distance = min;
        self
    }

    /// Sets the iteration budget.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the convergence threshold.
    #[must_use]
    pub const fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    /// Sets the minimum initial correspondence count.
    #[must_use]
    pub const fn with_min_correspondences(mut self, count: usize) -> Self {
        self.min_correspondences = count;
        self
    }

    /// Sets the quality rejection bound.
    #[must_use]
    pub const fn with_max_quality(mut self, max_quality: f64) -> Self {
        self.max_quality = max_quality;
        self
    }

    /// Sets the quality inlier radius in voxel edges.
    #[must_use]
    pub const fn with_inlier_voxels(mut self, inlier_voxels: f64) -> Self {
        self.inlier_voxels = inlier_voxels;
        self
    }

    /// Inlier radius for the quality score (m).
    #[must_use]
    pub fn inlier_distance(&self) -> f64 {
        self.inlier_voxels * self.voxel_size
    }

    /// Radius used at `iteration` (zero-based).
    #[must_use]
    pub fn radius_at(&self, iteration: usize) -> f64 {
        let decay = i32::try_from(iteration).map_or(0.0, |n| self.correspondence_decay.powi(n));
        (self.initial_correspondence_distance * decay).max(self.min_correspondence_distance)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("voxel_size", self.voxel_size),
            ("initial_correspondence_distance", self.initial_correspondence_distance),
            ("min_correspondence_distance", self.min_correspondence_distance),
            ("max_quality", self.max_quality),
            ("inlier_voxels", self.inlier_voxels),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(RegistrationError::invalid_config(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if !(self.correspondence_decay > 0.0 && self.correspondence_decay <= 1.0) {
            return Err(RegistrationError::invalid_config(format!(
                "correspondence_decay must be in (0, 1], got {}",
                self.correspondence_decay
            )));
        }
        if self.min_correspondence_distance > self.initial_correspondence_distance {
            return Err(RegistrationError::invalid_config(
                "min_correspondence_distance exceeds initial_correspondence_distance",
            ));
        }
        if self.max_iterations == 0 {
            return Err(RegistrationError::invalid_config(
                "max_iterations must be at least 1",
            ));
        }
        if !(self.convergence_threshold.is_finite() && self.convergence_threshold >= 0.0) {
            return Err(RegistrationError::invalid_config(format!(
                "convergence_threshold must be non-negative and finite, got {}",
                self.convergence_threshold
            )));
        }
        if self.min_correspondences < MIN_PAIRS_FOR_TRANSFORM {
            return Err(RegistrationError::invalid_config(format!(
                "min_correspondences must be at least {MIN_PAIRS_FOR_TRANSFORM}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(RegistrarConfig::default().validate().is_ok());
        assert!(RegistrarConfig::fast().validate().is_ok());
        assert!(RegistrarConfig::high_quality().validate().is_ok());
    }

    #[test]
    fn radius_shrinks_to_floor() {
        let c = RegistrarConfig::default();
        assert_eq!(c.radius_at(0), 10.0);
        assert!((c.radius_at(1) - 8.0).abs() < 1e-12);
        assert!(c.radius_at(5) < c.radius_at(4));
        assert_eq!(c.radius_at(1000), 0.25);
    }

    #[test]
    fn inlier_distance_follows_voxel_size() {
        let c = RegistrarConfig::default();
        assert!((c.inlier_distance() - 0.1).abs() < 1e-12);
        let coarse = c.with_voxel_size(0.2).with_inlier_voxels(3.0);
        assert!((coarse.inlier_distance() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn invalid_values_rejected() {
        let base = RegistrarConfig::default();
        assert!(base.clone().with_voxel_size(0.0).validate().is_err());
        assert!(base.clone().with_max_iterations(0).validate().is_err());
        assert!(base.clone().with_min_correspondences(2).validate().is_err());
        assert!(base.clone().with_max_quality(f64::NAN).validate().is_err());
        assert!(base.clone().with_inlier_voxels(0.0).validate().is_err());
        assert!(
            base.clone()
                .with_correspondence_schedule(1.0, 1.5, 0.1)
                .validate()
                .is_err()
        );
        assert!(
            base.with_correspondence_schedule(1.0, 0.5, 2.0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn json_partial_uses_defaults() {
        let c = RegistrarConfig::from_json(r#"{ "voxel_size": 0.2 }"#).unwrap();
        assert_eq!(c.voxel_size, 0.2);
        assert_eq!(c.max_iterations, 100);
    }

    #[test]
    fn json_errors() {
        assert!(matches!(
            RegistrarConfig::from_json("{"),
            Err(RegistrationError::Parse(_))
        ));
        assert!(matches!(
            RegistrarConfig::from_json(r#"{ "max_iterations": 0 }"#),
            Err(RegistrationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn json_roundtrip() {
        let c = RegistrarConfig::high_quality();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(RegistrarConfig::from_json(&json).unwrap(), c);
    }
}
