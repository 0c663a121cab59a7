// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use understory_sweep::{Direction, SweepList, SweepOrder};

struct Keys {
    keys: Vec<f64>,
    passes: usize,
}

impl SweepOrder for Keys {
    fn precedes(&self, a: usize, b: usize) -> bool {
        self.keys[a] < self.keys[b]
    }

    fn pass(&mut self, _mover: usize, _passed: usize, _direction: Direction) {
        self.passes += 1;
    }
}

fn build(n: usize, seed: u64) -> (SweepList, Keys) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keys = Keys {
        keys: (0..n).map(|_| rng.gen_range(0.0..n as f64)).collect(),
        passes: 0,
    };
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| keys.keys[a].total_cmp(&keys.keys[b]));
    let mut list = SweepList::new();
    let mut hint = None;
    for slot in order {
        match hint {
            Some(h) => list.insert_from(slot, h, &keys),
            None => list.push_front(slot),
        }
        hint = Some(slot);
    }
    keys.passes = 0;
    (list, keys)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_insert");
    for &n in &[1_000_usize, 10_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("sorted_batch_n{n}"), |b| {
            b.iter(|| {
                let (list, _) = build(n, 1);
                black_box(list.len());
            });
        });
    }
    group.finish();
}

fn bench_resort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_resort");
    for &(n, step) in &[(10_000_usize, 1.0), (10_000, 20.0), (100_000, 1.0)] {
        let (list, keys) = build(n, 2);
        let mut rng = StdRng::seed_from_u64(3);
        let moves: Vec<(usize, f64)> = (0..1_000)
            .map(|_| (rng.gen_range(0..n), rng.gen_range(-step..step)))
            .collect();
        group.throughput(Throughput::Elements(moves.len() as u64));
        group.bench_function(format!("jitter_n{n}_step{step}"), |b| {
            b.iter_batched(
                || {
                    (
                        list.clone(),
                        Keys {
                            keys: keys.keys.clone(),
                            passes: 0,
                        },
                    )
                },
                |(mut list, mut keys)| {
                    for &(slot, d) in &moves {
                        keys.keys[slot] += d;
                        list.resort(slot, &mut keys);
                    }
                    black_box(keys.passes);
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_resort);
criterion_main!(benches);
