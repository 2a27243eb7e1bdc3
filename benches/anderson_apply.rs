// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use transporter_anderson::Accelerator;
use utilities::{construct_decaying_sequence, construct_test_contraction, random_vector};

pub fn bench_apply_with_full_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_with_full_history");

    for num_rows in [32, 128, 512, 2048, 8192].into_iter() {
        let sequence = construct_decaying_sequence(num_rows, 10, 0.9);
        let mut accelerator = Accelerator::new(10, 1e6, 1e4);
        for (iterate, residual) in sequence.iter() {
            accelerator.apply(iterate, 0.8, residual).unwrap();
        }
        let iterate = random_vector(num_rows);
        let residual = random_vector(num_rows) * 1e-4;

        group.bench_with_input(BenchmarkId::from_parameter(num_rows), &num_rows, |b, _| {
            b.iter_batched(
                || accelerator.clone(),
                |mut accelerator| {
                    accelerator
                        .apply(black_box(&iterate), black_box(0.8), black_box(&residual))
                        .unwrap()
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

pub fn bench_linear_fixed_point(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_fixed_point");

    for history_depth in [0, 2, 5, 10].into_iter() {
        let contraction = construct_test_contraction(256, 0.95);
        let source = random_vector(256);
        group.bench_with_input(
            BenchmarkId::from_parameter(history_depth),
            &history_depth,
            |b, &history_depth| {
                b.iter(|| {
                    let mut accelerator = Accelerator::new(history_depth, 1e6, 1e4);
                    let mut x = nalgebra::DVector::zeros(256);
                    for _ in 0..50 {
                        let residual = contraction.component_mul(&x) + &source - &x;
                        x = accelerator.apply(&x, 1., &residual).unwrap();
                    }
                    x
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_apply_with_full_history,
    bench_linear_fixed_point
);
criterion_main!(benches);
