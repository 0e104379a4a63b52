//! Benchmarks for downsampling and registration.

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use map_registration::{Registrar, RegistrarConfig};
use map_types::{PointCloud, RigidTransform};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_cloud(n: usize, seed: u64) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    let points: Vec<_> = (0..n)
        .map(|_| {
            Point3::new(
                rng.gen_range(0.0..20.0),
                rng.gen_range(0.0..20.0),
                rng.gen_range(0.0..5.0),
            )
        })
        .collect();
    PointCloud::from_positions(&points)
}

fn bench_downsample(c: &mut Criterion) {
    let mut group = c.benchmark_group("voxel_downsample");
    for n in [1_000, 10_000, 100_000] {
        let cloud = random_cloud(n, 1);
        group.bench_with_input(BenchmarkId::from_parameter(n), &cloud, |b, cloud| {
            b.iter(|| black_box(cloud.voxel_downsample(0.1).unwrap()));
        });
    }
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("registrar_merge");
    group.sample_size(20);
    let registrar = Registrar::new(RegistrarConfig::default()).unwrap();
    let offset = RigidTransform::new(
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.05),
        Vector3::new(0.4, -0.3, 0.0),
    );
    for n in [1_000, 5_000, 20_000] {
        let reference = random_cloud(n, 2);
        let incoming = reference.transformed(&offset);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(registrar.merge(&reference, &incoming, None)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_downsample, bench_merge);
criterion_main!(benches);
