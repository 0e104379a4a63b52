//! Measurement stream identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SensorError;

/// One of the independent measurement streams a fuser consumes.
///
/// This is a closed set: configuration that names a stream is validated
/// when it is parsed, not matched against strings at ingestion time.
///
/// # Example
///
/// ```
/// use sensor_types::SensorStream;
///
/// let stream: SensorStream = "gps".parse().unwrap();
/// assert_eq!(stream, SensorStream::AbsolutePosition);
/// assert!("sonar".parse::<SensorStream>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorStream {
    /// Gyroscope and accelerometer samples.
    #[serde(alias = "imu")]
    Inertial,
    /// Pose estimates from a visual odometry pipeline.
    #[serde(alias = "visual")]
    VisualOdometry,
    /// Absolute position fixes (e.g. satellite positioning).
    #[serde(alias = "gps")]
    AbsolutePosition,
}

impl SensorStream {
    /// All streams, in a fixed order.
    pub const ALL: [Self; 3] = [Self::Inertial, Self::VisualOdometry, Self::AbsolutePosition];

    /// Canonical snake_case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Inertial => "inertial",
            Self::VisualOdometry => "visual_odometry",
            Self::AbsolutePosition => "absolute_position",
        }
    }

    /// Whether measurements on this stream drive the prediction step.
    #[must_use]
    pub const fn is_prediction(self) -> bool {
        matches!(self, Self::Inertial)
    }
}

impl fmt::Display for SensorStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorStream {
    type Err = SensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inertial" | "imu" => Ok(Self::Inertial),
            "visual_odometry" | "visual" => Ok(Self::VisualOdometry),
            "absolute_position" | "gps" => Ok(Self::AbsolutePosition),
            _ => Err(SensorError::unknown_stream(s)),
        }
    }
}
