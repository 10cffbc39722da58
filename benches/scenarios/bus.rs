//! The master bus under load, and the control-side cost of a sequencer bar.

use std::hint::black_box;

use beatpad::engine::bus::BusCommand;
use beatpad::engine::{AudioClock, MasterBus, SourceId};
use beatpad::kit::factory_kit;
use beatpad::sequencing::{row, SequencerPattern, StepSequencer};
use beatpad::synth::{synthesize, Voice, VoiceSink};
use beatpad::{EngineConfig, ReverbSettings};
use criterion::{BatchSize, BenchmarkId, Criterion};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

/// Hands voices straight to the bus, all starting at frame 0.
struct Direct {
    voices: Vec<Voice>,
}

impl VoiceSink for Direct {
    fn tempo(&self) -> f64 {
        120.0
    }

    fn schedule(&mut self, _at: f64, voice: Voice) {
        self.voices.push(voice);
    }
}

/// Counts scheduled voices and drops them.
#[derive(Default)]
struct Discard {
    scheduled: usize,
}

impl VoiceSink for Discard {
    fn tempo(&self) -> f64 {
        120.0
    }

    fn schedule(&mut self, _at: f64, _voice: Voice) {
        self.scheduled += 1;
    }
}

fn config() -> EngineConfig {
    EngineConfig::default()
        .sample_rate(SAMPLE_RATE)
        .reverb(ReverbSettings {
            duration: 0.5,
            ..ReverbSettings::default()
        })
}

/// A fresh bus with every single-hit factory pad queued at frame 0.
fn loaded_bus(config: &EngineConfig) -> MasterBus {
    let kit = factory_kit();
    let clock = AudioClock::new(SAMPLE_RATE);
    let (bus, mut handle) = MasterBus::new(config, &clock);

    let mut sink = Direct { voices: Vec::new() };
    for pad in kit.pads().iter().filter(|pad| !pad.is_loop()) {
        synthesize(pad, 0.0, 0.0, &mut sink);
    }
    for voice in sink.voices {
        let command = BusCommand::Start {
            source: SourceId::Manual,
            frame: 0,
            voice,
        };
        if handle.commands.push(command).is_err() {
            break;
        }
    }
    bus
}

pub fn bench_bus(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/bus");
    group.sample_size(20);
    let config = config();

    for &size in BLOCK_SIZES {
        let mut out = vec![0.0f32; size * 2];

        group.bench_with_input(BenchmarkId::new("full_kit", size), &size, |b, _| {
            b.iter_batched(
                || loaded_bus(&config),
                |mut bus| {
                    bus.render(black_box(&mut out), 2);
                    bus
                },
                BatchSize::LargeInput,
            )
        });

        // Reverb tail and compressor only
        let clock = AudioClock::new(SAMPLE_RATE);
        let (mut idle, _handle) = MasterBus::new(&config, &clock);
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| idle.render(black_box(&mut out), 2))
        });
    }

    group.finish();
}

pub fn bench_sequencer(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/sequencer");
    let kit = factory_kit();
    let pattern = SequencerPattern::new("bench", "Bench", 120)
        .unwrap()
        .with_row(0, row("x...x...x...x..."))
        .with_row(1, row("....x.......x..."))
        .with_row(2, row("x.x.x.x.x.x.x.x."))
        .with_row(5, row("x..x..x........."));

    // One bar at 120 bpm, polled every 25 ms
    group.bench_function("one_bar", |b| {
        b.iter_batched(
            || {
                let mut sequencer = StepSequencer::new(pattern.clone(), 0.1);
                sequencer.start(0.0);
                sequencer
            },
            |mut sequencer| {
                let mut sink = Discard::default();
                for poll in 0..80 {
                    sequencer.tick(f64::from(poll) * 0.025, &kit, &mut sink);
                }
                black_box(sink.scheduled)
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}
