use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use kornia_rotation::{axis_angle, ground_truth, local_affine, polar};

fn bench_nearest_rotation(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_rotation");

    let jacobian = [[1.1, -0.2, 0.05], [0.3, 0.9, 0.0], [-0.1, 0.25, 1.4]];

    group.bench_function(BenchmarkId::new("nearest_rotation", ""), |b| {
        b.iter(|| black_box(polar::nearest_rotation(black_box(&jacobian))));
    });

    group.bench_function(BenchmarkId::new("axis_angle_from_rotation_matrix", ""), |b| {
        let rotation = polar::nearest_rotation(&jacobian);
        b.iter(|| black_box(axis_angle::axis_angle_from_rotation_matrix(black_box(&rotation))));
    });
}

fn bench_local_affine(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_affine");

    let Ok(gt) = ground_truth::generate_seeded(Some([0.0, 0.0, 1.0]), Some(30.0), Some(42)) else {
        return;
    };
    let center = gt.field.grid().center();

    for radius in [1, 2, 4].iter() {
        let Ok(samples) = local_affine::sample_neighborhood(&gt.field, &center, *radius) else {
            continue;
        };
        group.throughput(criterion::Throughput::Elements(samples.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("sample_neighborhood", radius),
            radius,
            |b, &r| {
                b.iter(|| black_box(local_affine::sample_neighborhood(&gt.field, &center, r)));
            },
        );

        group.bench_with_input(BenchmarkId::new("fit_affine", radius), &samples, |b, s| {
            b.iter(|| black_box(local_affine::fit_affine(s)));
        });
    }
}

criterion_group!(benches, bench_nearest_rotation, bench_local_affine);
criterion_main!(benches);
