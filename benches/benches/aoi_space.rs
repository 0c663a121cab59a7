// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use understory_aoi::{EntityId, Position, Space};

const WORLD: f64 = 2000.0;

fn gen_positions(rng: &mut StdRng, n: usize) -> Vec<Position> {
    (0..n)
        .map(|_| Position::new(rng.gen_range(0.0..WORLD), 0.0, rng.gen_range(0.0..WORLD)))
        .collect()
}

/// A space where every `watch_every`-th entity has a view of `radius`.
fn populated(n: usize, watch_every: usize, radius: f64) -> (Space, Vec<EntityId>) {
    let mut rng = StdRng::seed_from_u64(0xa01);
    let mut space = Space::new();
    let ids = space.add_zero_radius_entities(&gen_positions(&mut rng, n));
    for id in ids.iter().step_by(watch_every) {
        space.set_view_radius(*id, radius, 0.0);
    }
    space.drain_events();
    (space, ids)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &n in &[1_000_usize, 10_000, 50_000] {
        let mut rng = StdRng::seed_from_u64(n as u64);
        let positions = gen_positions(&mut rng, n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("zero_radius_bulk_n{n}"), |b| {
            b.iter_batched(
                Space::new,
                |mut space| {
                    let ids = space.add_zero_radius_entities(&positions);
                    black_box(ids.len());
                },
                BatchSize::LargeInput,
            );
        });
        if n <= 10_000 {
            group.bench_function(format!("zero_radius_one_by_one_n{n}"), |b| {
                b.iter_batched(
                    Space::new,
                    |mut space| {
                        for &p in &positions {
                            black_box(space.add_entity(p));
                        }
                    },
                    BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("move");
    for &(n, radius) in &[(10_000_usize, 20.0), (10_000, 100.0), (50_000, 20.0)] {
        let (space, ids) = populated(n, 4, radius);
        let mut rng = StdRng::seed_from_u64(7);
        let steps: Vec<(usize, f64, f64)> = (0..1_000)
            .map(|_| {
                (
                    rng.gen_range(0..ids.len()),
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-5.0..5.0),
                )
            })
            .collect();
        group.throughput(Throughput::Elements(steps.len() as u64));
        group.bench_function(format!("small_steps_n{n}_r{radius}"), |b| {
            b.iter_batched(
                || space.clone(),
                |mut space| {
                    for &(i, dx, dz) in &steps {
                        let id = ids[i];
                        let p = space.position(id).unwrap();
                        space.move_entity(id, Position::new(p.x + dx, p.y, p.z + dz));
                    }
                    black_box(space.drain_events().count());
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_view_changes(c: &mut Criterion) {
    let mut group = c.benchmark_group("view");
    let (space, ids) = populated(10_000, 8, 30.0);
    group.bench_function("grow_shrink_radius_n10000", |b| {
        b.iter_batched(
            || space.clone(),
            |mut space| {
                for &id in ids.iter().step_by(50) {
                    space.set_view_radius(id, 80.0, 0.0);
                    space.set_view_radius(id, 10.0, 0.0);
                }
                black_box(space.drain_events().count());
            },
            BatchSize::LargeInput,
        );
    });
    group.bench_function("hysteresis_band_n10000", |b| {
        b.iter_batched(
            || space.clone(),
            |mut space| {
                for &id in ids.iter().step_by(50) {
                    space.set_view_radius(id, 30.0, 5.0);
                }
                black_box(space.drain_events().count());
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_moves, bench_view_changes);
criterion_main!(benches);
