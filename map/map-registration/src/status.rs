//! Registration outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a registration attempt ended.
///
/// Only [`Converged`](Self::Converged) produces a transform callers may
/// trust. Every other status leaves the reference cloud unchanged.
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// ICP converged and the quality score passed the rejection bound.
    Converged,
    /// Too few initial correspondences to attempt alignment.
    InsufficientOverlap {
        /// Correspondences found at the initial guess.
        found: usize,
        /// Configured minimum.
        required: usize,
    },
    /// ICP converged to an alignment whose quality is too poor.
    QualityRejected {
        /// The rejected score.
        quality: f64,
    },
    /// The iteration budget ran out, or pairs were lost, before convergence.
    DidNotConverge,
    /// One of the clouds was empty.
    EmptyCloud,
    /// Input was malformed, e.g. a non-finite coordinate or initial guess.
    InvalidInput {
        /// What was wrong.
        reason: String,
    },
}

impl RegistrationStatus {
    /// True only for a trusted alignment.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Converged)
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::InsufficientOverlap { found, required } => {
                write!(f, "insufficient overlap ({found} of {required} correspondences)")
            }
            Self::QualityRejected { quality } => write!(f, "quality {quality:.4} rejected"),
            Self::DidNotConverge => write!(f, "did not converge"),
            Self::EmptyCloud => write!(f, "empty cloud"),
            Self::InvalidInput { reason } => write!(f, "invalid input: {reason}"),
        }
    }
}
