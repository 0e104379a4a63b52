//! Session identity, state and alignment records.

use std::fmt;

use map_registration::RegistrationStatus;
use map_types::RigidTransform;
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

/// Identifies a session within one mapper. Allocated sequentially from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a session stands after its latest registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Added; its first registration attempt has not finished.
    Pending,
    /// Aligned to the global frame and folded into the global map.
    Registered,
    /// Registration failed; retained for a later retry.
    Rejected,
}

/// A session's native-to-global transform and its registration quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignmentTransform {
    /// Maps native session coordinates into the global frame.
    pub transform: RigidTransform,
    /// Registration quality, 0 best.
    pub quality: f64,
}

impl AlignmentTransform {
    /// The transform of the session that defines the global frame.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            transform: RigidTransform::identity(),
            quality: 0.0,
        }
    }

    /// The transform as a 4×4 homogeneous matrix.
    #[must_use]
    pub fn to_matrix4(&self) -> Matrix4<f64> {
        self.transform.to_matrix4()
    }
}

/// The result of adding or retrying a session.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    /// The session.
    pub id: SessionId,
    /// Its state after this attempt.
    pub state: SessionState,
    /// Its alignment, if registered.
    pub alignment: Option<AlignmentTransform>,
    /// The registrar's verdict for this attempt.
    pub status: RegistrationStatus,
    /// Global map size after the attempt.
    pub map_points: usize,
    /// Previously rejected sessions that registered as a consequence.
    pub recovered: Vec<SessionId>,
}

impl SessionOutcome {
    /// True if the session is registered.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.state == SessionState::Registered
    }
}

/// A read-only summary of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The session.
    pub id: SessionId,
    /// Current state.
    pub state: SessionState,
    /// Alignment, if registered.
    pub alignment: Option<AlignmentTransform>,
    /// Verdict of the latest attempt.
    pub last_status: RegistrationStatus,
    /// Registration attempts so far.
    pub attempts: u32,
    /// Points in the session's own cloud.
    pub points: usize,
    /// Poses in the session's trajectory.
    pub poses: usize,
}
