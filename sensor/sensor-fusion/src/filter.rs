//! Kalman-style estimator over position, velocity and orientation.
//!
//! One filter, three measurement models:
//!
//! - **Inertial** samples drive the prediction. Angular velocity is
//!   integrated on the right of the orientation, acceleration is rotated into
//!   the world frame (minus gravity) and integrated twice.
//! - **Visual odometry** corrects all six pose degrees of freedom. The
//!   orientation residual is the rotation vector of `q̂⁻¹ ⊗ q_meas` along the
//!   short arc, mapped onto the quaternion through `2 Ξ(q̂)ᵀ`.
//! - **Absolute position** corrects the position block only.
//!
//! The shared covariance is what lets a low-rate correction weigh itself
//! against the inertial drift accumulated since the previous one.

use nalgebra::{DMatrix, Matrix3, SMatrix, SVector, UnitQuaternion, Vector3, Vector4};
use sensor_types::{InertialSample, Measurement, PositionFix, VisualPose};
use tracing::{debug, warn};

use crate::config::FusionConfig;
use crate::error::Result;
use crate::history::{FusionStats, MeasurementHistory};
use crate::kinematics::{right_multiplication, rotation_jacobian, tangent_rotation, xi};
use crate::state::{
    FusedState, ORIENTATION, POSITION, STATE_DIM, StateCovariance, VELOCITY, symmetrise,
};
use crate::status::{FusionStatus, RejectReason};

/// The unsynchronized estimator.
///
/// Use [`StateFuser`](crate::StateFuser) to share one across threads.
///
/// # Example
///
/// ```
/// use sensor_fusion::{FusionConfig, FusionFilter, FusionStatus};
/// use sensor_types::{InertialSample, PositionFix};
/// use nalgebra::Vector3;
///
/// let mut filter = FusionFilter::new(FusionConfig::default()).unwrap();
///
/// let status = filter.process(&InertialSample::new(0.0, Vector3::zeros(), Vector3::zeros()).into());
/// assert_eq!(status, FusionStatus::ClockStarted);
///
/// let status = filter.process(&PositionFix::new(0.1, Vector3::new(1.0, 0.0, 0.0)).into());
/// assert_eq!(status, FusionStatus::Corrected);
/// assert!(filter.state().position.x > 0.9);
/// ```
#[derive(Debug, Clone)]
pub struct FusionFilter {
    config: FusionConfig,
    gravity: Vector3<f64>,
    state: FusedState,
    history: MeasurementHistory,
    stats: FusionStats,
}

impl FusionFilter {
    /// Creates a filter at the identity pose with the configured uncertainty.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidConfig`](crate::FusionError::InvalidConfig)
    /// if the configuration does not validate.
    pub fn new(config: FusionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            gravity: config.gravity_vector(),
            state: FusedState::initial(&config),
            history: MeasurementHistory::new(config.history_capacity),
            stats: FusionStats::default(),
            config,
        })
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> &FusedState {
        &self.state
    }

    /// Counters over all processed measurements.
    #[must_use]
    pub const fn stats(&self) -> FusionStats {
        self.stats
    }

    /// Recently accepted measurements.
    #[must_use]
    pub const fn history(&self) -> &MeasurementHistory {
        &self.history
    }

    /// Returns to the initial state and clears history and counters.
    pub fn reset(&mut self) {
        self.state = FusedState::initial(&self.config);
        self.history.clear();
        self.stats = FusionStats::default();
    }

    /// Feeds one measurement through the matching model.
    ///
    /// Never fails: invalid or degenerate input leaves the state unchanged
    /// and is reported in the returned status.
    pub fn process(&mut self, measurement: &Measurement) -> FusionStatus {
        let stream = measurement.stream();
        let status = if !self.config.accepts(stream) {
            FusionStatus::Rejected(RejectReason::StreamDisabled(stream))
        } else if !measurement.is_finite() {
            FusionStatus::Rejected(RejectReason::NonFiniteInput)
        } else {
            match measurement {
                Measurement::Inertial(sample) => self.predict(sample),
                Measurement::VisualOdometry(pose) => self.correct_visual(pose),
                Measurement::AbsolutePosition(fix) => self.correct_position(fix),
            }
        };
        self.record(measurement, status);
        status
    }

    fn record(&mut self, measurement: &Measurement, status: FusionStatus) {
        let stream = measurement.stream();
        match status {
            FusionStatus::Predicted { clamped, .. } => {
                if clamped {
                    self.stats.clamped += 1;
                }
                self.stats.record_accepted(stream);
                self.history.push(*measurement);
            }
            FusionStatus::ClockStarted | FusionStatus::Corrected => {
                self.stats.record_accepted(stream);
                self.history.push(*measurement);
            }
            FusionStatus::Rejected(reason) => {
                self.stats.rejected += 1;
                match reason {
                    RejectReason::NonPositiveDt { .. } | RejectReason::StreamDisabled(_) => {
                        debug!(%stream, %reason, "measurement ignored");
                    }
                    RejectReason::NonFiniteInput | RejectReason::DegenerateQuaternion => {
                        warn!(%stream, %reason, "measurement rejected");
                    }
                }
            }
            FusionStatus::SingularInnovation { .. } | FusionStatus::NonFiniteResult => {
                self.stats.degenerate += 1;
                warn!(%stream, %status, "update skipped");
            }
        }
    }

    fn predict(&mut self, sample: &InertialSample) -> FusionStatus {
        let Some(last) = self.state.timestamp else {
            self.state.timestamp = Some(sample.timestamp);
            return FusionStatus::ClockStarted;
        };

        let raw_dt = sample.timestamp - last;
        if raw_dt <= 0.0 {
            return FusionStatus::Rejected(RejectReason::NonPositiveDt { dt: raw_dt });
        }
        let clamped = raw_dt > self.config.max_dt;
        let dt = raw_dt.min(self.config.max_dt);
        if clamped {
            debug!(raw_dt, dt, "prediction interval clamped");
        }

        let q = self.state.orientation;
        let accel_body = sample.linear_acceleration;
        let accel = q * accel_body - self.gravity;
        let dq = UnitQuaternion::from_scaled_axis(sample.angular_velocity * dt);

        let mut f = StateCovariance::identity();
        f.fixed_view_mut::<3, 3>(POSITION, VELOCITY)
            .copy_from(&(Matrix3::identity() * dt));
        let j = rotation_jacobian(q.quaternion(), &accel_body);
        f.fixed_view_mut::<3, 4>(POSITION, ORIENTATION)
            .copy_from(&(j * (0.5 * dt * dt)));
        f.fixed_view_mut::<3, 4>(VELOCITY, ORIENTATION)
            .copy_from(&(j * dt));
        f.fixed_view_mut::<4, 4>(ORIENTATION, ORIENTATION)
            .copy_from(&right_multiplication(dq.quaternion()));

        let mut next = self.state.clone();
        next.position += self.state.velocity * dt + accel * (0.5 * dt * dt);
        next.velocity += accel * dt;
        next.orientation = q * dq;
        next.orientation.renormalize();
        next.covariance = f * self.state.covariance * f.transpose() + self.process_noise(dt);
        symmetrise(&mut next.covariance);
        next.timestamp = Some(sample.timestamp);

        self.commit(next, FusionStatus::Predicted { dt, clamped })
    }

    fn correct_visual(&mut self, pose: &VisualPose) -> FusionStatus {
        let Ok(measured) = pose.unit_orientation() else {
            return FusionStatus::Rejected(RejectReason::DegenerateQuaternion);
        };
        let q = self.state.orientation;

        let mut h = SMatrix::<f64, 6, STATE_DIM>::zeros();
        h.fixed_view_mut::<3, 3>(0, POSITION)
            .copy_from(&Matrix3::identity());
        h.fixed_view_mut::<3, 4>(3, ORIENTATION)
            .copy_from(&(xi(q.quaternion()).transpose() * 2.0));

        let mut innovation = SVector::<f64, 6>::zeros();
        innovation
            .fixed_rows_mut::<3>(0)
            .copy_from(&(pose.position - self.state.position));
        innovation
            .fixed_rows_mut::<3>(3)
            .copy_from(&rotation_residual(&q, &measured));

        let pos_var = self.config.visual_position_std.powi(2);
        let rot_var = self.config.visual_orientation_std.powi(2);
        let r = SMatrix::<f64, 6, 6>::from_diagonal(&SVector::<f64, 6>::from([
            pos_var, pos_var, pos_var, rot_var, rot_var, rot_var,
        ]));

        self.correct(&h, &innovation, &r, pose.timestamp)
    }

    fn correct_position(&mut self, fix: &PositionFix) -> FusionStatus {
        let mut h = SMatrix::<f64, 3, STATE_DIM>::zeros();
        h.fixed_view_mut::<3, 3>(0, POSITION)
            .copy_from(&Matrix3::identity());
        let innovation = fix.position - self.state.position;
        let r = Matrix3::identity() * self.config.absolute_position_std.powi(2);

        self.correct(&h, &innovation, &r, fix.timestamp)
    }

    /// Gain, state injection and Joseph-form covariance update.
    fn correct<const D: usize>(
        &mut self,
        h: &SMatrix<f64, D, STATE_DIM>,
        innovation: &SVector<f64, D>,
        r: &SMatrix<f64, D, D>,
        timestamp: f64,
    ) -> FusionStatus {
        let p = self.state.covariance;
        let s = h * p * h.transpose() + r;

        if let Some(skipped) = self.check_conditioning(&s) {
            return skipped;
        }
        let Some(s_inv) = s.try_inverse() else {
            return FusionStatus::SingularInnovation {
                min_eigenvalue: 0.0,
                condition: f64::INFINITY,
            };
        };

        let k = p * h.transpose() * s_inv;
        let dx = k * innovation;

        let mut next = self.state.clone();
        next.position += dx.fixed_rows::<3>(POSITION).into_owned();
        next.velocity += dx.fixed_rows::<3>(VELOCITY).into_owned();
        let dq: Vector4<f64> = dx.fixed_rows::<4>(ORIENTATION).into_owned();
        let dtheta = tangent_rotation(self.state.orientation.quaternion(), &dq);
        next.orientation = self.state.orientation * UnitQuaternion::from_scaled_axis(dtheta);
        next.orientation.renormalize();

        let i_kh = StateCovariance::identity() - k * h;
        next.covariance = i_kh * p * i_kh.transpose() + k * r * k.transpose();
        symmetrise(&mut next.covariance);
        next.timestamp = Some(self.state.timestamp.map_or(timestamp, |t| t.max(timestamp)));

        self.commit(next, FusionStatus::Corrected)
    }

    /// Skips inversion of an innovation covariance that is near-singular.
    fn check_conditioning<const D: usize>(
        &self,
        s: &SMatrix<f64, D, D>,
    ) -> Option<FusionStatus> {
        if s.iter().any(|v| !v.is_finite()) {
            return Some(FusionStatus::NonFiniteResult);
        }
        let eigenvalues = DMatrix::from_column_slice(D, D, s.as_slice()).symmetric_eigenvalues();
        let min_eigenvalue = eigenvalues.min();
        let max_eigenvalue = eigenvalues.max();
        let condition = if min_eigenvalue > 0.0 {
            max_eigenvalue / min_eigenvalue
        } else {
            f64::INFINITY
        };

        if min_eigenvalue <= self.config.min_eigenvalue || condition > self.config.max_condition {
            Some(FusionStatus::SingularInnovation {
                min_eigenvalue,
                condition,
            })
        } else {
            None
        }
    }

    fn process_noise(&self, dt: f64) -> StateCovariance {
        let mut diagonal = SVector::<f64, STATE_DIM>::zeros();
        diagonal
            .fixed_rows_mut::<3>(POSITION)
            .fill(self.config.position_noise_density.powi(2) * dt);
        diagonal
            .fixed_rows_mut::<3>(VELOCITY)
            .fill(self.config.accel_noise_density.powi(2) * dt);
        // A rotation-vector variance σ² maps to σ²/4 on each quaternion component.
        diagonal
            .fixed_rows_mut::<4>(ORIENTATION)
            .fill((0.5 * self.config.gyro_noise_density).powi(2) * dt);
        StateCovariance::from_diagonal(&diagonal)
    }

    fn commit(&mut self, next: FusedState, status: FusionStatus) -> FusionStatus {
        if next.is_finite() {
            self.state = next;
            status
        } else {
            FusionStatus::NonFiniteResult
        }
    }
}

/// Rotation vector taking `predicted` to `measured`, along the short arc.
fn rotation_residual(
    predicted: &UnitQuaternion<f64>,
    measured: &UnitQuaternion<f64>,
) -> Vector3<f64> {
    let delta = predicted.inverse() * measured;
    if delta.w < 0.0 {
        UnitQuaternion::new_unchecked(-delta.into_inner()).scaled_axis()
    } else {
        delta.scaled_axis()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Quaternion;
    use sensor_types::SensorStream;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn filter() -> FusionFilter {
        FusionFilter::new(FusionConfig::default()).unwrap()
    }

    fn imu(t: f64, gyro: Vector3<f64>, accel: Vector3<f64>) -> Measurement {
        InertialSample::new(t, gyro, accel).into()
    }

    fn visual(t: f64, position: Vector3<f64>, q: UnitQuaternion<f64>) -> Measurement {
        VisualPose::new(t, position, q.into_inner()).into()
    }

    #[test]
    fn first_inertial_sample_starts_clock() {
        let mut f = filter();
        let status = f.process(&imu(1.0, Vector3::z(), Vector3::x()));
        assert_eq!(status, FusionStatus::ClockStarted);
        assert_eq!(f.state().timestamp, Some(1.0));
        assert_eq!(f.state().position, Vector3::zeros());
        assert_eq!(f.state().orientation, UnitQuaternion::identity());
    }

    #[test]
    fn zero_input_keeps_pose() {
        let mut f = filter();
        for i in 0..200 {
            let status = f.process(&imu(f64::from(i) * 0.01, Vector3::zeros(), Vector3::zeros()));
            assert!(status.is_accepted());
        }
        assert_relative_eq!(f.state().position, Vector3::zeros(), epsilon = 1e-12);
        assert!(f.state().orientation.angle() < 1e-12);
    }

    #[test]
    fn prediction_grows_covariance() {
        let mut f = filter();
        let _ = f.process(&imu(0.0, Vector3::zeros(), Vector3::zeros()));
        let before = f.state().uncertainty();
        let _ = f.process(&imu(0.05, Vector3::zeros(), Vector3::zeros()));
        assert!(f.state().uncertainty() > before);
    }

    #[test]
    fn constant_acceleration_integrates_exactly() {
        let mut f = filter();
        let a = Vector3::new(1.0, 0.0, 0.0);
        for i in 0..=100 {
            let _ = f.process(&imu(f64::from(i) * 0.01, Vector3::zeros(), a));
        }
        // 1 s of 1 m/s²
        assert_relative_eq!(f.state().velocity.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(f.state().position.x, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn gravity_is_subtracted() {
        let config = FusionConfig::default().with_gravity([0.0, 0.0, 9.81]);
        let mut f = FusionFilter::new(config).unwrap();
        for i in 0..=50 {
            let _ = f.process(&imu(
                f64::from(i) * 0.01,
                Vector3::zeros(),
                Vector3::new(0.0, 0.0, 9.81),
            ));
        }
        assert_relative_eq!(f.state().velocity, Vector3::zeros(), epsilon = 1e-9);
    }

    #[test]
    fn acceleration_rotated_into_world() {
        let mut f = filter();
        // Yaw the body 90° first so body +x points along world +y.
        let _ = f.process(&visual(
            0.0,
            Vector3::zeros(),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2),
        ));
        let yaw_before = f.state().orientation;
        for i in 1..=10 {
            let _ = f.process(&imu(f64::from(i) * 0.01, Vector3::zeros(), Vector3::x()));
        }
        let expected_dir = yaw_before * Vector3::x();
        let v = f.state().velocity;
        assert_relative_eq!(v.normalize(), expected_dir, epsilon = 1e-9);
        assert!(expected_dir.y > 0.99);
    }

    #[test]
    fn yaw_rate_integrates_to_expected_angle() {
        let mut f = filter();
        let omega = Vector3::new(0.0, 0.0, 0.1);
        for i in 0..1000 {
            let status = f.process(&imu(f64::from(i) * 0.01, omega, Vector3::zeros()));
            assert!(status.is_accepted());
        }
        // 999 intervals of 10 ms after the clock-starting sample.
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 9.99);
        let got = f.state().orientation;
        let d = (got.coords - expected.coords)
            .norm()
            .min((got.coords + expected.coords).norm());
        assert!(d < 1e-9, "orientation off by {d}");
        assert_relative_eq!(got.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn out_of_order_inertial_rejected() {
        let mut f = filter();
        let _ = f.process(&imu(1.0, Vector3::zeros(), Vector3::zeros()));
        let before = f.state().clone();

        let status = f.process(&imu(1.0, Vector3::z(), Vector3::x()));
        assert_eq!(
            status,
            FusionStatus::Rejected(RejectReason::NonPositiveDt { dt: 0.0 })
        );
        let status = f.process(&imu(0.5, Vector3::z(), Vector3::x()));
        assert!(status.is_rejected());
        assert_eq!(f.state(), &before);
        assert_eq!(f.stats().rejected, 2);
    }

    #[test]
    fn non_finite_inertial_rejected() {
        let mut f = filter();
        let _ = f.process(&imu(0.0, Vector3::zeros(), Vector3::zeros()));
        let before = f.state().clone();
        let status = f.process(&imu(f64::NAN, Vector3::zeros(), Vector3::zeros()));
        assert_eq!(status, FusionStatus::Rejected(RejectReason::NonFiniteInput));
        let status = f.process(&imu(0.1, Vector3::new(f64::INFINITY, 0.0, 0.0), Vector3::zeros()));
        assert_eq!(status, FusionStatus::Rejected(RejectReason::NonFiniteInput));
        assert_eq!(f.state(), &before);
    }

    #[test]
    fn long_gap_is_clamped() {
        let mut f = filter();
        let _ = f.process(&imu(0.0, Vector3::zeros(), Vector3::zeros()));
        let status = f.process(&imu(5.0, Vector3::zeros(), Vector3::x()));
        assert_eq!(
            status,
            FusionStatus::Predicted {
                dt: 0.1,
                clamped: true
            }
        );
        assert_relative_eq!(f.state().velocity.x, 0.1, epsilon = 1e-12);
        assert_eq!(f.stats().clamped, 1);
        assert_eq!(f.state().timestamp, Some(5.0));
    }

    #[test]
    fn visual_correction_before_any_inertial() {
        let mut f = filter();
        let target = Vector3::new(2.0, -1.0, 0.5);
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.3);
        let status = f.process(&visual(0.0, target, q));
        assert_eq!(status, FusionStatus::Corrected);
        // Large prior uncertainty: the first fix is almost fully trusted.
        assert_relative_eq!(f.state().position, target, epsilon = 1e-3);
        assert!(f.state().orientation.angle_to(&q) < 1e-3);
        assert_eq!(f.state().timestamp, Some(0.0));
    }

    #[test]
    fn visual_correction_shrinks_covariance() {
        let mut f = filter();
        let before = f.state().uncertainty();
        let _ = f.process(&visual(0.0, Vector3::zeros(), UnitQuaternion::identity()));
        let after = f.state().uncertainty();
        assert!(after < before);
        let p = f.state().position_covariance();
        assert!(p[(0, 0)] < 0.01);
    }

    #[test]
    fn visual_correction_takes_short_arc() {
        let mut f = filter();
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.2);
        // Same rotation expressed with a negative scalar part.
        let flipped = Quaternion::from(-q.into_inner().coords);
        let status = f.process(&VisualPose::new(0.0, Vector3::zeros(), flipped).into());
        assert_eq!(status, FusionStatus::Corrected);
        assert!(f.state().orientation.angle_to(&q) < 1e-3);
    }

    #[test]
    fn visual_half_turn_is_finite() {
        let mut f = filter();
        let q = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI);
        let status = f.process(&visual(0.0, Vector3::zeros(), q));
        assert_eq!(status, FusionStatus::Corrected);
        assert!(f.state().is_finite());
        assert_relative_eq!(f.state().orientation.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn visual_unnormalized_quaternion_is_normalized() {
        let mut f = filter();
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.4);
        let scaled = q.into_inner() * 3.0;
        let status = f.process(&VisualPose::new(0.0, Vector3::zeros(), scaled).into());
        assert_eq!(status, FusionStatus::Corrected);
        assert!(f.state().orientation.angle_to(&q) < 1e-3);
    }

    #[test]
    fn visual_zero_quaternion_rejected() {
        let mut f = filter();
        let before = f.state().clone();
        let status = f.process(
            &VisualPose::new(0.0, Vector3::x(), Quaternion::new(0.0, 0.0, 0.0, 0.0)).into(),
        );
        assert_eq!(
            status,
            FusionStatus::Rejected(RejectReason::DegenerateQuaternion)
        );
        assert_eq!(f.state(), &before);
    }

    #[test]
    fn absolute_position_moves_position_only() {
        let mut f = filter();
        let status = f.process(&PositionFix::new(0.0, Vector3::new(10.0, 0.0, 0.0)).into());
        assert_eq!(status, FusionStatus::Corrected);
        assert!(f.state().position.x > 9.9);
        assert_relative_eq!(f.state().velocity, Vector3::zeros());
        assert!(f.state().orientation.angle() < 1e-12);
    }

    #[test]
    fn weighting_follows_noise() {
        // Equal prior and measurement variance split the difference.
        let config = FusionConfig::default()
            .with_initial_std(1.0, 1.0, 1.0)
            .with_absolute_position_noise(1.0);
        let mut f = FusionFilter::new(config).unwrap();
        let _ = f.process(&PositionFix::new(0.0, Vector3::new(2.0, 0.0, 0.0)).into());
        assert_relative_eq!(f.state().position.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(f.state().position_covariance()[(0, 0)], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn singular_innovation_skips_update() {
        let config = FusionConfig::default().with_absolute_position_noise(0.0);
        let mut f = FusionFilter::new(config).unwrap();

        let status = f.process(&PositionFix::new(0.0, Vector3::new(1.0, 2.0, 3.0)).into());
        assert_eq!(status, FusionStatus::Corrected);
        let before = f.state().clone();

        // Position variance is now zero and so is the measurement noise.
        let status = f.process(&PositionFix::new(0.1, Vector3::new(5.0, 5.0, 5.0)).into());
        assert!(matches!(status, FusionStatus::SingularInnovation { .. }));
        assert_eq!(f.state(), &before);
        assert_eq!(f.stats().degenerate, 1);
        assert!(f.state().is_finite());
    }

    #[test]
    fn correction_advances_clock_for_next_prediction() {
        let mut f = filter();
        let _ = f.process(&imu(0.0, Vector3::zeros(), Vector3::zeros()));
        let _ = f.process(&PositionFix::new(0.05, Vector3::zeros()).into());
        assert_eq!(f.state().timestamp, Some(0.05));

        let status = f.process(&imu(0.06, Vector3::zeros(), Vector3::zeros()));
        match status {
            FusionStatus::Predicted { dt, clamped } => {
                assert_relative_eq!(dt, 0.01, epsilon = 1e-12);
                assert!(!clamped);
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn stale_correction_does_not_rewind_clock() {
        let mut f = filter();
        let _ = f.process(&imu(1.0, Vector3::zeros(), Vector3::zeros()));
        let _ = f.process(&PositionFix::new(0.5, Vector3::zeros()).into());
        assert_eq!(f.state().timestamp, Some(1.0));
    }

    #[test]
    fn disabled_stream_rejected() {
        let config = FusionConfig::default().with_streams([SensorStream::Inertial]);
        let mut f = FusionFilter::new(config).unwrap();
        let status = f.process(&PositionFix::new(0.0, Vector3::x()).into());
        assert_eq!(
            status,
            FusionStatus::Rejected(RejectReason::StreamDisabled(
                SensorStream::AbsolutePosition
            ))
        );
        assert_eq!(f.state().position, Vector3::zeros());
    }

    #[test]
    fn history_and_stats_track_accepted() {
        let mut f = filter();
        let _ = f.process(&imu(0.0, Vector3::zeros(), Vector3::zeros()));
        let _ = f.process(&imu(0.01, Vector3::zeros(), Vector3::zeros()));
        let _ = f.process(&PositionFix::new(0.02, Vector3::zeros()).into());
        let _ = f.process(&imu(f64::NAN, Vector3::zeros(), Vector3::zeros()));

        let stats = f.stats();
        assert_eq!(stats.inertial, 2);
        assert_eq!(stats.absolute, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(f.history().len(), 3);

        f.reset();
        assert!(f.history().is_empty());
        assert_eq!(f.stats(), FusionStats::default());
        assert!(f.state().timestamp.is_none());
    }

    #[test]
    fn rotation_residual_is_minimal() {
        let a = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.1);
        let b = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), -0.2);
        let r = rotation_residual(&a, &b);
        assert_relative_eq!(r, Vector3::new(0.0, 0.0, -0.3), epsilon = 1e-12);

        let flipped = UnitQuaternion::new_unchecked(-b.into_inner());
        let r = rotation_residual(&a, &flipped);
        assert_relative_eq!(r, Vector3::new(0.0, 0.0, -0.3), epsilon = 1e-12);
    }

    #[test]
    fn covariance_stays_symmetric() {
        let mut f = filter();
        for i in 0..50 {
            let t = f64::from(i) * 0.02;
            let _ = f.process(&imu(t, Vector3::new(0.1, -0.2, 0.3), Vector3::new(0.5, 0.1, -0.2)));
            if i % 10 == 5 {
                let _ = f.process(&visual(
                    t,
                    Vector3::new(t, 0.0, 0.0),
                    UnitQuaternion::from_euler_angles(0.0, 0.0, t),
                ));
            }
        }
        let p = f.state().covariance;
        assert_relative_eq!(p, p.transpose(), epsilon = 1e-9);
        assert!(p.diagonal().iter().all(|v| *v >= 0.0));
    }
}
