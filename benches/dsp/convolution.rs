//! Partitioned convolution reverb.
//!
//! Cost is dominated by one FFT round trip per partition boundary plus one
//! complex multiply-add per impulse partition, so it scales with the
//! impulse length rather than the block size.

use std::hint::black_box;

use beatpad::dsp::convolution::{Convolver, ImpulseResponse, StereoConvolver};
use criterion::{BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_convolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/convolution");
    group.sample_size(30);

    for seconds in [0.5f32, 2.0] {
        let impulse = ImpulseResponse::generate(SAMPLE_RATE, seconds, 3.0, 7).normalized();

        for &size in BLOCK_SIZES {
            let input: Vec<f32> = (0..size).map(|i| if i == 0 { 1.0 } else { 0.0 }).collect();

            let mut mono = Convolver::new(&impulse.left);
            let id = BenchmarkId::new(format!("mono_{seconds}s"), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| {
                    let mut acc = 0.0f32;
                    for &x in &input {
                        acc += mono.process(black_box(x));
                    }
                    black_box(acc)
                })
            });

            let mut stereo = StereoConvolver::new(&impulse);
            let id = BenchmarkId::new(format!("stereo_{seconds}s"), size);
            group.bench_with_input(id, &size, |b, _| {
                b.iter(|| {
                    let mut acc = 0.0f32;
                    for &x in &input {
                        let (l, r) = stereo.process(black_box(x));
                        acc += l + r;
                    }
                    black_box(acc)
                })
            });
        }
    }

    group.finish();
}
