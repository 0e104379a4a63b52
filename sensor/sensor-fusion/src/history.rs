//! Bounded diagnostic history of accepted measurements.

use std::collections::VecDeque;

use sensor_types::{Measurement, SensorStream};
use serde::{Deserialize, Serialize};

/// A bounded, arrival-ordered log of measurements the fuser accepted.
///
/// Kept for diagnostics only; the estimate never reads from it. When full,
/// the oldest entry is evicted.
///
/// # Example
///
/// ```
/// use sensor_fusion::MeasurementHistory;
/// use sensor_types::{Measurement, PositionFix};
/// use nalgebra::Vector3;
///
/// let mut history = MeasurementHistory::new(2);
/// for t in [0.0, 1.0, 2.0] {
///     history.push(PositionFix::new(t, Vector3::zeros()).into());
/// }
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.oldest().unwrap().timestamp(), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct MeasurementHistory {
    capacity: usize,
    entries: VecDeque<Measurement>,
}

impl MeasurementHistory {
    /// Creates an empty history holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::with_capacity(capacity.clamp(1, 1024)),
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a measurement, evicting the oldest if full.
    pub fn push(&mut self, measurement: Measurement) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(measurement);
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The oldest retained entry.
    #[must_use]
    pub fn oldest(&self) -> Option<&Measurement> {
        self.entries.front()
    }

    /// The newest entry.
    #[must_use]
    pub fn latest(&self) -> Option<&Measurement> {
        self.entries.back()
    }

    /// The newest entry from `stream`.
    #[must_use]
    pub fn latest_of(&self, stream: SensorStream) -> Option<&Measurement> {
        self.entries.iter().rev().find(|m| m.stream() == stream)
    }

    /// Up to `n` newest entries, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<Measurement> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).copied().collect()
    }

    /// Iterates over entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Measurement> {
        self.entries.iter()
    }
}

/// Running counters over everything a fuser has been given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionStats {
    /// Inertial samples that propagated the state or started the clock.
    pub inertial: u64,
    /// Visual corrections applied.
    pub visual: u64,
    /// Absolute position corrections applied.
    pub absolute: u64,
    /// Measurements rejected as invalid input.
    pub rejected: u64,
    /// Updates skipped because of numerical degeneracy.
    pub degenerate: u64,
    /// Predictions whose interval was clamped.
    pub clamped: u64,
}

impl FusionStats {
    /// Accepted measurement count for one stream.
    #[must_use]
    pub const fn accepted(&self, stream: SensorStream) -> u64 {
        match stream {
            SensorStream::Inertial => self.inertial,
            SensorStream::VisualOdometry => self.visual,
            SensorStream::AbsolutePosition => self.absolute,
        }
    }

    /// Total accepted measurements across streams.
    #[must_use]
    pub const fn total_accepted(&self) -> u64 {
        self.inertial + self.visual + self.absolute
    }

    pub(crate) fn record_accepted(&mut self, stream: SensorStream) {
        match stream {
            SensorStream::Inertial => self.inertial += 1,
            SensorStream::VisualOdometry => self.visual += 1,
            SensorStream::AbsolutePosition => self.absolute += 1,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use nalgebra::{Quaternion, Vector3};
    use sensor_types::{InertialSample, PositionFix, VisualPose};

    fn imu(t: f64) -> Measurement {
        InertialSample::new(t, Vector3::zeros(), Vector3::zeros()).into()
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut history = MeasurementHistory::new(3);
        for i in 0..5 {
            history.push(imu(f64::from(i)));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.capacity(), 3);
        assert_eq!(history.oldest().unwrap().timestamp(), 2.0);
        assert_eq!(history.latest().unwrap().timestamp(), 4.0);
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut history = MeasurementHistory::new(0);
        history.push(imu(0.0));
        history.push(imu(1.0));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn latest_of_stream() {
        let mut history = MeasurementHistory::new(10);
        history.push(imu(0.0));
        history.push(PositionFix::new(0.5, Vector3::x()).into());
        history.push(imu(1.0));
        let fix = history.latest_of(SensorStream::AbsolutePosition).unwrap();
        assert_eq!(fix.timestamp(), 0.5);
        assert!(history.latest_of(SensorStream::VisualOdometry).is_none());

        history.push(VisualPose::new(2.0, Vector3::zeros(), Quaternion::identity()).into());
        assert_eq!(
            history
                .latest_of(SensorStream::VisualOdometry)
                .unwrap()
                .timestamp(),
            2.0
        );
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let mut history = MeasurementHistory::new(10);
        for i in 0..6 {
            history.push(imu(f64::from(i)));
        }
        let tail: Vec<f64> = history.recent(3).iter().map(Measurement::timestamp).collect();
        assert_eq!(tail, vec![3.0, 4.0, 5.0]);
        assert_eq!(history.recent(100).len(), 6);
        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn stats_counters() {
        let mut stats = FusionStats::default();
        stats.record_accepted(SensorStream::Inertial);
        stats.record_accepted(SensorStream::Inertial);
        stats.record_accepted(SensorStream::AbsolutePosition);
        assert_eq!(stats.accepted(SensorStream::Inertial), 2);
        assert_eq!(stats.accepted(SensorStream::VisualOdometry), 0);
        assert_eq!(stats.total_accepted(), 3);
    }
}
