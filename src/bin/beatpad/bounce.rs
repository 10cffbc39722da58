//! Offline bounce: play the sequencer into a WAV file as fast as it renders.

use std::path::Path;

use beatpad::{
    engine::{step_duration, OfflineBackend, STEPS_PER_CYCLE},
    io::RandomGenerator,
    sequencing::{row, SequencerPattern},
    DrumMachine, EngineConfig,
};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use hound::WavWriter;
use tracing::info;

use super::wav::float_spec;

/// Reverb and release time rendered after the last bar, in seconds.
const TAIL: f64 = 2.0;

pub struct BounceOptions {
    pub bpm: u32,
    pub bars: u32,
    pub prompt: Option<String>,
    pub seed: u64,
}

fn demo_pattern(bpm: u32) -> EyreResult<SequencerPattern> {
    Ok(SequencerPattern::new("demo", "Demo", bpm)?
        .with_row(0, row("x.....x...x....."))
        .with_row(1, row("....x.......x..."))
        .with_row(2, row("x.x.x.x.x.x.x.x."))
        .with_row(3, row("...............x"))
        .with_row(5, row("x.........x.....")))
}

pub fn run(path: &Path, options: &BounceOptions) -> EyreResult<()> {
    let config = EngineConfig::default();
    let sample_rate = config.sample_rate;
    let block = (config.poll_interval.as_secs_f64() * f64::from(sample_rate)).round() as usize;
    let mut machine = DrumMachine::new(OfflineBackend::new(sample_rate), config);

    match &options.prompt {
        Some(prompt) => {
            let mut generator = RandomGenerator::new(options.seed);
            machine.generate_pattern(&mut generator, prompt)?;
        }
        None => machine.load_pattern(demo_pattern(options.bpm)?),
    }
    machine.start_sequencer()?;

    let bpm = f64::from(machine.pattern().bpm());
    let bar = step_duration(bpm) * STEPS_PER_CYCLE as f64;
    let end = machine.config().start_delay + bar * f64::from(options.bars);
    let total = end + TAIL;
    info!(bpm, bars = options.bars, seconds = total, "bouncing");

    let channels = machine.backend().channels() as u16;
    let mut writer = WavWriter::create(path, float_spec(channels, sample_rate))
        .wrap_err_with(|| format!("failed to create {}", path.display()))?;

    // Stopping once the clock passes the last bar cancels everything after
    // it, so the bounce ends on the following downbeat
    while machine.now() < total {
        if machine.now() >= end && machine.playback().sequencer().is_playing() {
            machine.stop_sequencer();
        }
        machine.tick()?;
        for sample in machine.backend_mut().render(block) {
            writer.write_sample(sample)?;
        }
    }
    writer.finalize()?;

    println!("wrote {:.1}s to {}", total, path.display());
    Ok(())
}
