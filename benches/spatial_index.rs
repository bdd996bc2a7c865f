//! Benchmarks for the periodic spatial index
//!
//! 1. **`PeriodicIndex::build`**: median-split k-d tree construction
//! 2. **`nearest_k`**: the forward `k = 2` query used by the pairing stage
//! 3. **`ball`**: exclusion-radius queries used by the isolation stage

#![allow(missing_docs)] // Criterion macros generate undocumented functions

mod util;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use halo_pairs::core::spatial_index::PeriodicIndex;
use halo_pairs::geometry::periodic_box::PeriodicBox;
use halo_pairs::geometry::util::generate_random_catalog_seeded;
use std::hint::black_box;
use util::{bench_config, get_benchmark_seed};

const BOX_SIZE: f64 = 1000.0;

fn wrapped_positions(n_points: usize, seed: u64) -> Vec<[f64; 3]> {
    let domain = PeriodicBox::<3>::new(BOX_SIZE).unwrap();
    generate_random_catalog_seeded(n_points, BOX_SIZE, (0.0, 1.0), seed)
        .unwrap()
        .rows()
        .map(|row| {
            let mut position = *row.position();
            domain.recenter(&mut position).unwrap();
            position
        })
        .collect()
}

fn benchmark_build(c: &mut Criterion) {
    let seed = get_benchmark_seed();
    let domain = PeriodicBox::<3>::new(BOX_SIZE).unwrap();
    let mut group = c.benchmark_group("periodic_index_build");

    for &n_points in &[1_000_usize, 10_000, 100_000] {
        group.throughput(Throughput::Elements(n_points as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n_points), &n_points, |b, &n| {
            b.iter_batched(
                || wrapped_positions(n, seed),
                |positions| black_box(PeriodicIndex::build(domain, &positions).unwrap()),
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn benchmark_queries(c: &mut Criterion) {
    let seed = get_benchmark_seed();
    let domain = PeriodicBox::<3>::new(BOX_SIZE).unwrap();
    let mut group = c.benchmark_group("periodic_index_queries");

    for &n_points in &[1_000_usize, 10_000, 100_000] {
        let positions = wrapped_positions(n_points, seed);
        let index = PeriodicIndex::build(domain, &positions).unwrap();
        let mean_spacing = BOX_SIZE / (n_points as f64).cbrt();
        group.throughput(Throughput::Elements(n_points as u64));

        group.bench_with_input(BenchmarkId::new("nearest_k_2", n_points), &index, |b, index| {
            b.iter(|| {
                for position in &positions {
                    black_box(index.nearest_k(position, 2, Some(domain.half_side())));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("ball", n_points), &index, |b, index| {
            b.iter(|| {
                for position in &positions {
                    black_box(index.ball(position, mean_spacing));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    name = benches;
    config = bench_config();
    targets = benchmark_build, benchmark_queries
);
criterion_main!(benches);
