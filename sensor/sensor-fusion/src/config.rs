//! Fuser configuration.

use nalgebra::Vector3;
use sensor_types::SensorStream;
use serde::{Deserialize, Serialize};

use crate::error::{FusionError, Result};

/// Standard gravity along -Z, for inputs that report raw specific force.
pub const GRAVITY_Z_UP: [f64; 3] = [0.0, 0.0, 9.806_65];

/// Configuration for the state fuser.
///
/// Noise terms are standard deviations. Process noise terms are densities:
/// their variance is scaled by the prediction interval.
///
/// The default gravity is the zero vector because inertial samples are
/// expected to carry gravity-compensated linear acceleration. Use
/// [`with_gravity`](Self::with_gravity) with [`GRAVITY_Z_UP`] when feeding raw
/// accelerometer output.
///
/// # Example
///
/// ```
/// use sensor_fusion::FusionConfig;
///
/// let config = FusionConfig::default().with_max_dt(0.05);
/// assert!(config.is_valid());
///
/// let parsed = FusionConfig::from_json(r#"{ "max_dt": 0.2 }"#).unwrap();
/// assert_eq!(parsed.max_dt, 0.2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Gravity vector in the world frame, subtracted from rotated acceleration.
    pub gravity: [f64; 3],

    /// Upper bound on a single prediction interval (seconds).
    pub max_dt: f64,

    /// Initial position standard deviation (m).
    pub initial_position_std: f64,

    /// Initial velocity standard deviation (m/s).
    pub initial_velocity_std: f64,

    /// Initial standard deviation of each quaternion component.
    pub initial_orientation_std: f64,

    /// Position random walk (m/√s).
    pub position_noise_density: f64,

    /// Accelerometer noise density (m/s²/√Hz).
    pub accel_noise_density: f64,

    /// Gyroscope noise density (rad/s/√Hz).
    pub gyro_noise_density: f64,

    /// Visual odometry position noise (m).
    pub visual_position_std: f64,

    /// Visual odometry orientation noise (rad).
    pub visual_orientation_std: f64,

    /// Absolute position fix noise (m).
    pub absolute_position_std: f64,

    /// Smallest innovation covariance eigenvalue accepted before inversion.
    pub min_eigenvalue: f64,

    /// Largest innovation covariance condition number accepted before inversion.
    pub max_condition: f64,

    /// Number of accepted measurements kept for diagnostics.
    pub history_capacity: usize,

    /// Streams this fuser accepts. Measurements from other streams are rejected.
    pub enabled_streams: Vec<SensorStream>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0; 3],
            max_dt: 0.1,
            initial_position_std: 10.0,
            initial_velocity_std: 10.0,
            initial_orientation_std: 10.0,
            position_noise_density: 0.01,
            accel_noise_density: 0.1,
            gyro_noise_density: 0.01,
            visual_position_std: 0.05,
            visual_orientation_std: 0.02,
            absolute_position_std: 0.5,
            min_eigenvalue: 1e-12,
            max_condition: 1e12,
            history_capacity: 256,
            enabled_streams: SensorStream::ALL.to_vec(),
        }
    }
}

impl FusionConfig {
    /// Parses a JSON configuration and validates it.
    ///
    /// Missing fields take their default values. Unknown stream names fail
    /// to parse.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::Parse`] for malformed JSON or unknown stream
    /// names, and [`FusionError::InvalidConfig`] if validation fails.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the gravity vector.
    #[must_use]
    pub const fn with_gravity(mut self, gravity: [f64; 3]) -> Self {
        self.gravity = gravity;
        self
    }

    /// Sets the maximum prediction interval.
    #[must_use]
    pub const fn with_max_dt(mut self, max_dt: f64) -> Self {
        self.max_dt = max_dt;
        self
    }

    /// Sets visual odometry noise.
    #[must_use]
    pub const fn with_visual_noise(mut self, position_std: f64, orientation_std: f64) -> Self {
        self.visual_position_std = position_std;
        self.visual_orientation_std = orientation_std;
        self
    }

    /// Sets absolute position fix noise.
    #[must_use]
    pub const fn with_absolute_position_noise(mut self, position_std: f64) -> Self {
        self.absolute_position_std = position_std;
        self
    }

    /// Sets inertial process noise densities.
    #[must_use]
    pub const fn with_process_noise(
        mut self,
        position_density: f64,
        accel_density: f64,
        gyro_density: f64,
    ) -> Self {
        self.position_noise_density = position_density;
        self.accel_noise_density = accel_density;
        self.gyro_noise_density = gyro_density;
        self
    }

    /// Sets the initial state uncertainty.
    #[must_use]
    pub const fn with_initial_std(
        mut self,
        position_std: f64,
        velocity_std: f64,
        orientation_std: f64,
    ) -> Self {
        self.initial_position_std = position_std;
        self.initial_velocity_std = velocity_std;
        self.initial_orientation_std = orientation_std;
        self
    }

    /// Sets the diagnostic history capacity.
    #[must_use]
    pub const fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Restricts the accepted streams.
    #[must_use]
    pub fn with_streams(mut self, streams: impl IntoIterator<Item = SensorStream>) -> Self {
        self.enabled_streams = streams.into_iter().collect();
        self
    }

    /// Gravity as a vector.
    #[must_use]
    pub fn gravity_vector(&self) -> Vector3<f64> {
        Vector3::from(self.gravity)
    }

    /// True if measurements from `stream` are accepted.
    #[must_use]
    pub fn accepts(&self, stream: SensorStream) -> bool {
        self.enabled_streams.contains(&stream)
    }

    /// Returns `true` if all values are valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(FusionError::invalid_config("gravity must be finite"));
        }
        positive("max_dt", self.max_dt)?;
        positive("initial_position_std", self.initial_position_std)?;
        positive("initial_velocity_std", self.initial_velocity_std)?;
        positive("initial_orientation_std", self.initial_orientation_std)?;
        non_negative("position_noise_density", self.position_noise_density)?;
        non_negative("accel_noise_density", self.accel_noise_density)?;
        non_negative("gyro_noise_density", self.gyro_noise_density)?;
        non_negative("visual_position_std", self.visual_position_std)?;
        non_negative("visual_orientation_std", self.visual_orientation_std)?;
        non_negative("absolute_position_std", self.absolute_position_std)?;
        positive("min_eigenvalue", self.min_eigenvalue)?;
        if !(self.max_condition.is_finite() && self.max_condition > 1.0) {
            return Err(FusionError::invalid_config(format!(
                "max_condition must be finite and greater than 1, got {}",
                self.max_condition
            )));
        }
        if self.history_capacity == 0 {
            return Err(FusionError::invalid_config(
                "history_capacity must be at least 1",
            ));
        }
        if self.enabled_streams.is_empty() {
            return Err(FusionError::invalid_config(
                "enabled_streams must name at least one stream",
            ));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FusionError::invalid_config(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FusionError::invalid_config(format!(
            "{name} must be non-negative and finite, got {value}"
        )))
    }
}
