//! Every factory pad rendered as the bus renders it: one voice, block by
//! block, from its first sample.

use std::hint::black_box;

use beatpad::kit::factory_kit;
use beatpad::synth::{synthesize, Voice, VoiceSink};
use criterion::{BatchSize, BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

#[derive(Default)]
struct Collect {
    voices: Vec<Voice>,
}

impl VoiceSink for Collect {
    fn tempo(&self) -> f64 {
        120.0
    }

    fn schedule(&mut self, _at: f64, voice: Voice) {
        self.voices.push(voice);
    }
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let kit = factory_kit();

    for pad in kit.pads().iter().filter(|pad| !pad.is_loop()) {
        for &size in BLOCK_SIZES {
            let mut out = vec![0.0f32; size];
            let mut scratch = vec![0.0f32; size];
            let name = pad.label().to_lowercase().replace(' ', "_");

            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter_batched(
                    || {
                        let mut sink = Collect::default();
                        synthesize(pad, 0.0, 0.0, &mut sink);
                        sink.voices
                    },
                    |voices| {
                        for mut voice in voices {
                            voice.start(SAMPLE_RATE);
                            out.fill(0.0);
                            voice.render_into(&mut out, &mut scratch, SAMPLE_RATE);
                        }
                        black_box(&out);
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }

    group.finish();
}
