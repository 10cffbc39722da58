//! Master bus compressor.

use std::hint::black_box;

use beatpad::dsp::dynamics::{Compressor, CompressorSettings};
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_dynamics(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/dynamics");

    for &size in BLOCK_SIZES {
        // Alternates between quiet and well over threshold
        let input: Vec<f32> = (0..size)
            .map(|i| if (i / 32) % 2 == 0 { 0.05 } else { 0.9 })
            .collect();
        let mut comp = Compressor::new(CompressorSettings::default(), SAMPLE_RATE);

        group.bench_with_input(BenchmarkId::new("compressor", size), &size, |b, _| {
            b.iter(|| {
                let mut peak = 0.0f32;
                for &x in &input {
                    peak = peak.max(comp.process(black_box(x)).abs());
                }
                black_box(peak)
            })
        });
    }

    group.finish();
}
