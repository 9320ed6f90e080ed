// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgb, RgbImage};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recon_eval::evaluation::evaluate_histogram;
use recon_eval::geometry::nearest_distances;
use recon_eval::image_metrics::{ssim, SsimParams};
use recon_eval::PointCloud;

fn random_cloud(n: usize, seed: u64) -> PointCloud {
    let mut rng = StdRng::seed_from_u64(seed);
    PointCloud::new(
        (0..n)
            .map(|_| Point3::new(rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>()))
            .collect(),
    )
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_distances");

    for size in [1_000, 10_000, 100_000] {
        let a = random_cloud(size, 1);
        let b = random_cloud(size, 2);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bench, _| {
            bench.iter(|| nearest_distances(black_box(&a.points), black_box(&b.points)));
        });
    }

    group.finish();
}

fn bench_voxel(c: &mut Criterion) {
    let cloud = random_cloud(100_000, 3);
    c.bench_function("voxel_down_sample_100k", |b| {
        b.iter(|| cloud.voxel_down_sample(black_box(0.05)));
    });
}

fn bench_histogram(c: &mut Criterion) {
    let recon = random_cloud(20_000, 4);
    let gt = random_cloud(20_000, 5);
    c.bench_function("evaluate_histogram_20k", |b| {
        b.iter(|| evaluate_histogram(black_box(&recon), black_box(&gt), 0.05, 0.1, 3.0));
    });
}

fn bench_ssim(c: &mut Criterion) {
    let mut group = c.benchmark_group("ssim");
    let params = SsimParams::default();

    for size in [256u32, 512] {
        let a = RgbImage::from_fn(size, size, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        let b = RgbImage::from_fn(size, size, |x, y| Rgb([(y % 256) as u8, (x % 256) as u8, 96]));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bench, _| {
            bench.iter(|| ssim(black_box(&a), black_box(&b), &params));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_nearest, bench_voxel, bench_histogram, bench_ssim);
criterion_main!(benches);
