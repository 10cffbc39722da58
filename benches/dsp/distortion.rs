//! Waveshapers.

use std::hint::black_box;

use beatpad::dsp::distortion::{saturate_buffer, soft_clip_buffer};
use criterion::{BenchmarkId, Criterion};

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        let ramp: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();
        let mut buffer = ramp.clone();

        group.bench_with_input(BenchmarkId::new("soft_clip", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&ramp);
                soft_clip_buffer(black_box(&mut buffer), black_box(4.0));
            })
        });

        group.bench_with_input(BenchmarkId::new("saturate", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&ramp);
                saturate_buffer(black_box(&mut buffer), black_box(4.0));
            })
        });
    }

    group.finish();
}
