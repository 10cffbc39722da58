//! State-variable filter modes.

use std::hint::black_box;

use beatpad::dsp::filter::SVFilter;
use beatpad::dsp::oscillator::OscillatorBlock;
use beatpad::graph::RenderCtx;
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let ctx = RenderCtx::from_freq(SAMPLE_RATE, 440.0, 1.0);

    for &size in BLOCK_SIZES {
        let mut noise = vec![0.0f32; size];
        OscillatorBlock::noise().render(&mut noise, &ctx);
        let mut buffer = noise.clone();

        let filters = [
            ("lowpass", SVFilter::lowpass(800.0)),
            ("highpass", SVFilter::highpass(7_000.0)),
            ("bandpass", SVFilter::bandpass(1_200.0)),
        ];
        for (name, mut filter) in filters {
            filter.set_resonance(0.6);
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&noise);
                    filter.render(black_box(&mut buffer), black_box(&ctx));
                })
            });
        }

        // Hat chain: two highpass stages in series
        let mut first = SVFilter::highpass(7_000.0);
        let mut second = SVFilter::highpass(9_000.0);
        group.bench_with_input(BenchmarkId::new("hat_chain", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&noise);
                first.render(&mut buffer, &ctx);
                second.render(black_box(&mut buffer), &ctx);
            })
        });
    }

    group.finish();
}
