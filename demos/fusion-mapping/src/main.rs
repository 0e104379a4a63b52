//! Fusion + Mapping demo.
//!
//! Drives a simulated robot around a circle, fuses its inertial, visual
//! and satellite measurements into a pose stream, then folds two capture
//! sessions of a synthetic room into one global map. The second session is
//! recorded in its own frame, and the mapper recovers that frame's offset.

use std::f64::consts::TAU;

use anyhow::{Context, Result};
use map_sessions::{MapperConfig, MultiSessionMapper, SessionState};
use map_types::{PointCloud, RigidTransform, Session, Trajectory};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sensor_fusion::{FusionConfig, StateFuser};

const IMU_RATE_HZ: u32 = 100;
const RADIUS: f64 = 2.0;
const YAW_RATE: f64 = 0.5;

fn main() -> Result<()> {
    println!("=== Fusion + Mapping Demo ===");
    println!();

    let mut rng = StdRng::seed_from_u64(7);
    let fuser = StateFuser::new(FusionConfig::default()).context("fuser configuration")?;

    let first = fuse_leg(&fuser, &mut rng, 0.0, 10.0);
    let second = fuse_leg(&fuser, &mut rng, 10.0, 20.0);

    let stats = fuser.stats();
    let pose = fuser.fused_pose();
    let truth = true_position(20.0);
    println!("Fusion:");
    println!(
        "  inertial {} / visual {} / absolute {} accepted, {} rejected, {} degenerate",
        stats.inertial, stats.visual, stats.absolute, stats.rejected, stats.degenerate
    );
    println!(
        "  final position ({:.3}, {:.3}, {:.3}), error {:.3} m",
        pose.position.x,
        pose.position.y,
        pose.position.z,
        (pose.position - truth).norm()
    );
    println!("  uncertainty (trace) {:.4}", fuser.snapshot().uncertainty());
    println!();

    let room = synthetic_room(&mut rng, 3000);
    let session_offset = RigidTransform::new(
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 5f64.to_radians()),
        Vector3::new(0.8, -0.4, 0.0),
    );
    let to_native = session_offset.inverse();

    let session_a = Session::new(visible(&room, |p| p.x < 3.0), first);
    let session_b = Session::new(
        visible(&room, |p| p.x > -3.0).transformed(&to_native),
        second.transformed(&to_native),
    );

    let mapper = MultiSessionMapper::new(MapperConfig::default()).context("mapper configuration")?;
    for (name, session) in [("A", session_a), ("B", session_b)] {
        let points = session.cloud.len();
        let outcome = mapper.add_session(session);
        println!(
            "Session {name} ({points} points): {:?}, {}",
            outcome.state, outcome.status
        );
        if let Some(alignment) = outcome.alignment {
            let t = alignment.transform.translation;
            println!(
                "  transform: rotation {:.2} deg, translation ({:.3}, {:.3}, {:.3}), quality {:.4}",
                alignment.transform.angle().to_degrees(),
                t.x,
                t.y,
                t.z,
                alignment.quality
            );
        }
        println!("  global map: {} points", outcome.map_points);
    }

    println!();
    let expected = session_offset.translation;
    println!(
        "Expected session B offset: rotation 5.00 deg, translation ({:.3}, {:.3}, {:.3})",
        expected.x, expected.y, expected.z
    );
    for record in mapper.sessions() {
        if record.state == SessionState::Registered {
            if let Some(trajectory) = mapper.session_trajectory(record.id) {
                println!(
                    "Session {}: {} poses, path {:.2} m in global frame",
                    record.id,
                    trajectory.len(),
                    trajectory.path_length()
                );
            }
        }
    }

    Ok(())
}

fn true_position(t: f64) -> Vector3<f64> {
    let yaw = YAW_RATE * t;
    Vector3::new(RADIUS * yaw.sin(), RADIUS * (1.0 - yaw.cos()), 0.0)
}

/// Simulates `[start, end)` of the circle and returns the fused trajectory,
/// sampled at the visual rate.
fn fuse_leg(fuser: &StateFuser, rng: &mut StdRng, start: f64, end: f64) -> Trajectory {
    let mut trajectory = Trajectory::new();
    let speed = RADIUS * YAW_RATE;
    let dt = 1.0 / f64::from(IMU_RATE_HZ);

    let mut tick: u32 = 0;
    loop {
        let t = start + f64::from(tick) * dt;
        if t >= end {
            break;
        }

        let omega = Vector3::new(0.0, 0.0, YAW_RATE + rng.gen_range(-0.01..0.01));
        let accel = Vector3::new(rng.gen_range(-0.05..0.05), speed * YAW_RATE, 0.0);
        let _ = fuser.add_inertial(omega, accel, t);

        if tick % 10 == 0 {
            let noise = Vector3::new(rng.gen_range(-0.03..0.03), rng.gen_range(-0.03..0.03), 0.0);
            let yaw = (YAW_RATE * t) % TAU;
            let orientation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw);
            let _ = fuser.add_visual(true_position(t) + noise, orientation.into_inner(), t);
            trajectory.push(t, fuser.fused_pose());
        }
        if tick % IMU_RATE_HZ == 0 {
            let noise = Vector3::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5), 0.0);
            let _ = fuser.add_absolute_position(true_position(t) + noise, t);
        }
        tick += 1;
    }
    trajectory
}

fn synthetic_room(rng: &mut StdRng, n: usize) -> PointCloud {
    let points: Vec<_> = (0..n)
        .map(|_| {
            Point3::new(
                rng.gen_range(-6.0..6.0),
                rng.gen_range(-6.0..6.0),
                rng.gen_range(0.0..3.0),
            )
        })
        .collect();
    PointCloud::from_positions(&points)
}

fn visible(room: &PointCloud, predicate: impl Fn(&Point3<f64>) -> bool) -> PointCloud {
    room.points
        .iter()
        .filter(|p| predicate(&p.position))
        .copied()
        .collect()
}
