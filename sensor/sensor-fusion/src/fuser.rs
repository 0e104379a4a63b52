//! Thread-safe handle around the estimator.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use parking_lot::Mutex;
use sensor_types::{InertialSample, Measurement, Pose3d, PositionFix, VisualPose};

use crate::config::FusionConfig;
use crate::error::Result;
use crate::filter::FusionFilter;
use crate::history::FusionStats;
use crate::state::FusedState;
use crate::status::FusionStatus;

/// A state fuser shared by independent measurement producers.
///
/// Every operation takes `&self` and holds one lock for a bounded,
/// allocation-light computation; wrap in an `Arc` to hand the same fuser to
/// several capture loops. Readers get copies, never references into the
/// live state.
///
/// # Example
///
/// ```
/// use sensor_fusion::{FusionConfig, StateFuser};
/// use nalgebra::Vector3;
/// use std::sync::Arc;
///
/// let fuser = Arc::new(StateFuser::new(FusionConfig::default()).unwrap());
///
/// let imu = Arc::clone(&fuser);
/// let handle = std::thread::spawn(move || {
///     for i in 0..10 {
///         let _ = imu.add_inertial(Vector3::zeros(), Vector3::zeros(), f64::from(i) * 0.01);
///     }
/// });
/// handle.join().unwrap();
///
/// let pose = fuser.fused_pose();
/// assert_eq!(pose.position, Vector3::zeros());
/// ```
#[derive(Debug)]
pub struct StateFuser {
    filter: Mutex<FusionFilter>,
}

impl StateFuser {
    /// Creates a fuser at the identity pose.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: FusionConfig) -> Result<Self> {
        Ok(Self {
            filter: Mutex::new(FusionFilter::new(config)?),
        })
    }

    /// Prediction step from a body-frame inertial sample.
    pub fn add_inertial(
        &self,
        angular_velocity: Vector3<f64>,
        linear_acceleration: Vector3<f64>,
        timestamp: f64,
    ) -> FusionStatus {
        self.ingest(InertialSample::new(
            timestamp,
            angular_velocity,
            linear_acceleration,
        ))
    }

    /// Full-pose correction from visual odometry.
    ///
    /// The quaternion need not be normalized, only non-zero.
    pub fn add_visual(
        &self,
        position: Vector3<f64>,
        orientation: Quaternion<f64>,
        timestamp: f64,
    ) -> FusionStatus {
        self.ingest(VisualPose::new(timestamp, position, orientation))
    }

    /// Position-only correction.
    pub fn add_absolute_position(&self, position: Vector3<f64>, timestamp: f64) -> FusionStatus {
        self.ingest(PositionFix::new(timestamp, position))
    }

    /// Feeds any measurement.
    pub fn ingest(&self, measurement: impl Into<Measurement>) -> FusionStatus {
        let measurement = measurement.into();
        self.filter.lock().process(&measurement)
    }

    /// Current position and orientation.
    #[must_use]
    pub fn fused_pose(&self) -> Pose3d {
        self.filter.lock().state().pose()
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vector3<f64> {
        self.filter.lock().state().position
    }

    /// Current velocity.
    #[must_use]
    pub fn velocity(&self) -> Vector3<f64> {
        self.filter.lock().state().velocity
    }

    /// Current orientation.
    #[must_use]
    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.filter.lock().state().orientation
    }

    /// Copy of the full state, covariance included.
    #[must_use]
    pub fn snapshot(&self) -> FusedState {
        self.filter.lock().state().clone()
    }

    /// Counters over all processed measurements.
    #[must_use]
    pub fn stats(&self) -> FusionStats {
        self.filter.lock().stats()
    }

    /// Up to `n` most recently accepted measurements, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<Measurement> {
        self.filter.lock().history().recent(n)
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> FusionConfig {
        self.filter.lock().config().clone()
    }

    /// Re-initializes to the identity pose and clears history.
    pub fn reset(&self) {
        self.filter.lock().reset();
    }
}
