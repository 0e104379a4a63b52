//! Pose trajectories recorded during a capture session.

use sensor_types::{Pose3d, StampedPose, TrajectoryRecord};
use serde::{Deserialize, Serialize};

use crate::transform::RigidTransform;

/// Time-ordered poses of the sensor rig.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    poses: Vec<StampedPose>,
}

impl Trajectory {
    /// An empty trajectory.
    #[must_use]
    pub const fn new() -> Self {
        Self { poses: Vec::new() }
    }

    /// Appends a pose.
    pub fn push(&mut self, timestamp: f64, pose: Pose3d) {
        self.poses.push(StampedPose::new(timestamp, pose));
    }

    /// Number of poses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// True if there are no poses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// The poses in order.
    #[must_use]
    pub fn poses(&self) -> &[StampedPose] {
        &self.poses
    }

    /// Most recent pose.
    #[must_use]
    pub fn last(&self) -> Option<&StampedPose> {
        self.poses.last()
    }

    /// Time covered, or `None` with fewer than two poses.
    #[must_use]
    pub fn duration(&self) -> Option<f64> {
        match (self.poses.first(), self.poses.last()) {
            (Some(a), Some(b)) if self.poses.len() > 1 => Some(b.timestamp - a.timestamp),
            _ => None,
        }
    }

    /// Sum of distances between consecutive positions.
    #[must_use]
    pub fn path_length(&self) -> f64 {
        self.poses
            .windows(2)
            .map(|w| (w[1].pose.position - w[0].pose.position).norm())
            .sum()
    }

    /// The trajectory expressed in another frame.
    ///
    /// Each pose `P` becomes `T ∘ P`, so positions move with the transform
    /// and orientations are pre-multiplied by its rotation.
    #[must_use]
    pub fn transformed(&self, transform: &RigidTransform) -> Self {
        self.poses
            .iter()
            .map(|s| {
                let pose = Pose3d::new(
                    transform.rotation * s.pose.position + transform.translation,
                    transform.rotation * s.pose.orientation,
                );
                StampedPose::new(s.timestamp, pose)
            })
            .collect()
    }

    /// Flat records for persistence.
    #[must_use]
    pub fn to_records(&self) -> Vec<TrajectoryRecord> {
        self.poses.iter().map(TrajectoryRecord::from).collect()
    }
}

impl FromIterator<StampedPose> for Trajectory {
    fn from_iter<I: IntoIterator<Item = StampedPose>>(iter: I) -> Self {
        Self {
            poses: iter.into_iter().collect(),
        }
    }
}
