//! Outcome of a single measurement ingestion.

use std::fmt;

use sensor_types::SensorStream;
use serde::{Deserialize, Serialize};

/// What happened to one measurement.
///
/// Every ingestion returns a status instead of failing: invalid input and
/// numerical degeneracy leave the state untouched and say why.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FusionStatus {
    /// State and covariance propagated over `dt` seconds.
    Predicted {
        /// Integration interval actually used, after clamping.
        dt: f64,
        /// True if the raw interval exceeded the configured maximum.
        clamped: bool,
    },
    /// First timestamp recorded; there was no interval to integrate over.
    ClockStarted,
    /// A correction was applied.
    Corrected,
    /// The measurement was invalid and ignored.
    Rejected(RejectReason),
    /// The innovation covariance was too ill-conditioned to invert; the
    /// update was skipped.
    SingularInnovation {
        /// Smallest eigenvalue of the innovation covariance.
        min_eigenvalue: f64,
        /// Ratio of largest to smallest eigenvalue.
        condition: f64,
    },
    /// The update produced non-finite values and was reverted.
    NonFiniteResult,
}

impl FusionStatus {
    /// True if the state changed.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Predicted { .. } | Self::Corrected)
    }

    /// True if the measurement was consumed without error, including the
    /// clock-starting first sample.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(
            self,
            Self::Predicted { .. } | Self::Corrected | Self::ClockStarted
        )
    }

    /// True if the input itself was invalid.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// True if the update was skipped for numerical reasons.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        matches!(self, Self::SingularInnovation { .. } | Self::NonFiniteResult)
    }
}

impl fmt::Display for FusionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicted { dt, clamped: false } => write!(f, "predicted over {dt:.4}s"),
            Self::Predicted { dt, clamped: true } => {
                write!(f, "predicted over {dt:.4}s (clamped)")
            }
            Self::ClockStarted => f.write_str("clock started"),
            Self::Corrected => f.write_str("corrected"),
            Self::Rejected(reason) => write!(f, "rejected: {reason}"),
            Self::SingularInnovation {
                min_eigenvalue,
                condition,
            } => write!(
                f,
                "skipped: singular innovation (min eigenvalue {min_eigenvalue:.3e}, condition {condition:.3e})"
            ),
            Self::NonFiniteResult => f.write_str("skipped: update produced non-finite state"),
        }
    }
}

/// Why a measurement was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    /// A timestamp or vector component was NaN or infinite.
    NonFiniteInput,
    /// The interval since the previous measurement was zero or negative.
    NonPositiveDt {
        /// The offending interval.
        dt: f64,
    },
    /// The orientation quaternion could not be normalized.
    DegenerateQuaternion,
    /// The stream is not enabled in the configuration.
    StreamDisabled(SensorStream),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteInput => f.write_str("non-finite input"),
            Self::NonPositiveDt { dt } => write!(f, "non-positive interval {dt}"),
            Self::DegenerateQuaternion => f.write_str("quaternion cannot be normalized"),
            Self::StreamDisabled(stream) => write!(f, "stream {stream} is disabled"),
        }
    }
}
