//! Percussive and multi-burst envelopes.

use std::hint::black_box;

use beatpad::dsp::envelope::Envelope;
use beatpad::graph::RenderCtx;
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let ctx = RenderCtx::from_freq(SAMPLE_RATE, 440.0, 1.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        let mut env = Envelope::percussive(0.001, 0.5);
        group.bench_with_input(BenchmarkId::new("percussive", size), &size, |b, _| {
            b.iter(|| {
                env.note_on(&ctx);
                env.render(black_box(&mut buffer));
            })
        });

        // Clap: three bursts 10 ms apart
        let mut env = Envelope::bursts(3, 0.01, 0.15);
        group.bench_with_input(BenchmarkId::new("bursts", size), &size, |b, _| {
            b.iter(|| {
                env.note_on(&ctx);
                env.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
