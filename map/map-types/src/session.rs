//! Capture sessions.

use serde::{Deserialize, Serialize};

use crate::cloud::PointCloud;
use crate::trajectory::Trajectory;

/// One independent capture: a point cloud and the trajectory that produced
/// it, both in the session's own native frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Cloud in the native frame.
    pub cloud: PointCloud,
    /// Trajectory in the native frame.
    pub trajectory: Trajectory,
}

impl Session {
    /// Creates a session.
    #[must_use]
    pub const fn new(cloud: PointCloud, trajectory: Trajectory) -> Self {
        Self { cloud, trajectory }
    }

    /// A session with a cloud and no trajectory.
    #[must_use]
    pub const fn from_cloud(cloud: PointCloud) -> Self {
        Self::new(cloud, Trajectory::new())
    }
}
