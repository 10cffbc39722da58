//! Oscillator waveforms, fixed and swept.

use std::hint::black_box;

use beatpad::dsp::oscillator::OscillatorBlock;
use beatpad::graph::RenderCtx;
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let ctx = RenderCtx::from_freq(SAMPLE_RATE, 55.0, 1.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        let waveforms = [
            ("sine", OscillatorBlock::sine()),
            ("saw", OscillatorBlock::sawtooth()),
            ("square", OscillatorBlock::square()),
            ("triangle", OscillatorBlock::triangle()),
            ("noise", OscillatorBlock::noise()),
        ];
        for (name, mut osc) in waveforms {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| osc.render(black_box(&mut buffer), black_box(&ctx)))
            });
        }

        // Kick-style pitch drop: a new frequency every sample
        let mut osc = OscillatorBlock::sine();
        group.bench_with_input(BenchmarkId::new("sine_swept", size), &size, |b, _| {
            b.iter(|| {
                let mut freq = 150.0f32;
                for sample in buffer.iter_mut() {
                    *sample = osc.next_sample(freq, SAMPLE_RATE);
                    freq *= 0.9995;
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
