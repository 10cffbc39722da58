//! Summing and dry/wet blends.

use std::hint::black_box;

use beatpad::dsp::mix::{apply_dry_wet, mix_in_place, sum_in_place};
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/mix");

    for &size in BLOCK_SIZES {
        let voice = vec![0.25f32; size];
        let wet = vec![-0.1f32; size];
        let mut bus = vec![0.0f32; size];

        // Sixteen voices onto one bus
        group.bench_with_input(BenchmarkId::new("sum_16", size), &size, |b, _| {
            b.iter(|| {
                bus.fill(0.0);
                for _ in 0..16 {
                    sum_in_place(black_box(&mut bus), black_box(&voice));
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("mix_in_place", size), &size, |b, _| {
            b.iter(|| mix_in_place(black_box(&mut bus), black_box(&wet), 0.3))
        });

        group.bench_with_input(BenchmarkId::new("dry_wet", size), &size, |b, _| {
            b.iter(|| apply_dry_wet(black_box(&voice), black_box(&mut bus), 0.3))
        });
    }

    group.finish();
}
