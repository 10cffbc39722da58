//! End-to-end behaviour of the drum machine, rendered offline.

use beatpad::{
    engine::OfflineBackend,
    io::GeneratedPattern,
    kit::{Kit, PadSpec, SoundType},
    sequencing::{row, LooseGrid, SequencerPattern, SongArrangement, SongSection, STEPS},
    ArrangementError, ConfigurationError, DrumError, DrumMachine, EngineConfig, PlaybackMode,
    ReverbSettings,
};

const SAMPLE_RATE: f32 = 48_000.0;
/// One control poll: 25 ms
const BLOCK: usize = 1_200;

fn dry_config() -> EngineConfig {
    EngineConfig::default()
        .sample_rate(SAMPLE_RATE)
        .reverb(ReverbSettings {
            duration: 0.1,
            ..ReverbSettings::default()
        })
        .reverb_mix(0.0)
}

fn machine() -> DrumMachine<OfflineBackend> {
    DrumMachine::new(OfflineBackend::new(SAMPLE_RATE), dry_config())
}

/// Alternate control ticks with 25 ms renders until the clock reaches
/// `until`. Returns the left channel.
fn run_until(machine: &mut DrumMachine<OfflineBackend>, until: f64) -> Vec<f32> {
    let mut left = Vec::new();
    while machine.now() < until {
        machine.tick().unwrap();
        let frames = machine.backend_mut().render(BLOCK);
        left.extend(frames.chunks(2).map(|frame| frame[0]));
    }
    left
}

fn started(machine: &DrumMachine<OfflineBackend>) -> u64 {
    machine.stats().map_or(0, |stats| stats.started())
}

fn onsets(signal: &[f32], threshold: f32, min_gap: usize) -> Vec<usize> {
    let mut found: Vec<usize> = Vec::new();
    for (i, sample) in signal.iter().enumerate() {
        let clear = found.last().map_or(true, |&last| i - last >= min_gap);
        if sample.abs() > threshold && clear {
            found.push(i);
        }
    }
    found
}

#[test]
fn a_bar_at_120_bpm_lasts_two_seconds() {
    let mut machine = machine();
    let click = PadSpec::new(0, '1', "Kick", SoundType::Kick)
        .frequency(60.0)
        .decays(0.05, 0.2)
        .build()
        .unwrap();
    machine
        .load_kit(Kit::new("click", vec![click]).unwrap())
        .unwrap();
    machine.load_pattern(
        SequencerPattern::new("p", "P", 120)
            .unwrap()
            .with_row(0, row("x...............")),
    );

    machine.start_sequencer().unwrap();
    let out = run_until(&mut machine, 4.5);

    let hits = onsets(&out, 1e-3, SAMPLE_RATE as usize);
    assert!(hits.len() >= 3, "found {hits:?}");
    assert_eq!(hits[1] - hits[0], 96_000);
    assert_eq!(hits[2] - hits[1], 96_000);
}

#[test]
fn stopping_right_after_start_plays_nothing() {
    let mut machine = machine();
    machine.toggle_step(0, 0).unwrap();
    machine.toggle_step(2, 1).unwrap();

    machine.start_sequencer().unwrap();
    // The first steps are committed to the bus before the stop arrives
    let report = machine.tick().unwrap();
    assert!(report.steps > 0);
    machine.stop_sequencer();

    run_until(&mut machine, 1.0);
    assert_eq!(started(&machine), 0);
    assert_eq!(machine.playback().mode(), PlaybackMode::Idle);
}

#[test]
fn toggling_a_step_twice_restores_it() {
    let mut machine = machine();
    let before = machine.pattern().clone();

    assert!(machine.toggle_step(4, 7).unwrap());
    assert!(!machine.toggle_step(4, 7).unwrap());
    assert_eq!(machine.pattern(), &before);

    assert!(matches!(
        machine.toggle_step(4, STEPS),
        Err(DrumError::Configuration(ConfigurationError::StepOutOfRange(16)))
    ));
}

#[test]
fn the_output_is_acquired_once() {
    let mut machine = machine();
    assert_eq!(machine.backend().opens(), 0);

    machine.trigger_pad(0, 0.0).unwrap();
    machine.trigger_pad(1, 0.0).unwrap();
    machine.start_sequencer().unwrap();
    machine.start_recording().unwrap();

    assert_eq!(machine.backend().opens(), 1);
}

#[test]
fn song_plays_each_section_then_stops() {
    let mut machine = machine();
    for id in ["a", "b"] {
        let pattern = SequencerPattern::new(id, id, 300)
            .unwrap()
            .with_row(2, row("x.x.x.x.x.x.x.x."));
        machine.add_pattern(pattern);
    }
    let song = SongArrangement::new("song", "Song")
        .section(SongSection::new("verse", "Verse", "a", 2))
        .section(SongSection::new("chorus", "Chorus", "b", 2));
    machine.start_song(song).unwrap();

    let mut steps = 0;
    let mut halted = false;
    while machine.now() < 6.0 && !halted {
        let report = machine.tick().unwrap();
        steps += report.steps;
        halted = report.halted;
        machine.backend_mut().render(BLOCK);
    }

    assert!(halted);
    assert_eq!(steps, 64);
    assert_eq!(machine.playback().mode(), PlaybackMode::Idle);
}

#[test]
fn song_halts_on_a_missing_pattern_and_names_the_section() {
    let mut machine = machine();
    machine.add_pattern(SequencerPattern::new("a", "A", 300).unwrap());
    let song = SongArrangement::new("song", "Song")
        .section(SongSection::new("intro", "Intro", "a", 1))
        .section(SongSection::new("drop", "Drop", "gone", 1));
    machine.start_song(song).unwrap();

    let mut error = None;
    while machine.now() < 3.0 && error.is_none() {
        match machine.tick() {
            Ok(_) => {}
            Err(err) => error = Some(err),
        }
        machine.backend_mut().render(BLOCK);
    }

    match error {
        Some(DrumError::Arrangement(ArrangementError::PatternNotFound { section, .. })) => {
            assert_eq!(section, "Drop")
        }
        other => panic!("expected a missing pattern, got {other:?}"),
    }
    assert_eq!(machine.playback().mode(), PlaybackMode::Idle);
}

#[test]
fn generated_pattern_with_a_short_row_is_rejected() {
    let mut machine = machine();
    machine.toggle_step(0, 0).unwrap();
    let before = machine.pattern().clone();

    let mut grid: LooseGrid = machine
        .kit()
        .pads()
        .iter()
        .filter(|pad| !pad.is_loop())
        .map(|pad| (pad.id(), vec![true; STEPS]))
        .collect();
    grid.insert(3, vec![true; 12]);

    let result = machine.apply_generated(GeneratedPattern { grid, bpm: 128 });
    assert!(matches!(
        result,
        Err(DrumError::Configuration(ConfigurationError::StepCountMismatch {
            pad: 3,
            len: 12
        }))
    ));
    assert_eq!(machine.pattern(), &before);
}

#[test]
fn loops_start_and_stop_independently() {
    let mut machine = machine();
    machine.set_loop_mode(true);

    // Kick loop from 0.05 s, closed hat from 0.30 s, both every beat
    machine.pad_pressed(0).unwrap();
    run_until(&mut machine, 0.25);
    machine.pad_pressed(2).unwrap();
    run_until(&mut machine, 2.0);
    assert_eq!(started(&machine), 8);

    machine.pad_pressed(0).unwrap();
    let looping: Vec<_> = machine.playback().loops().pads().collect();
    assert_eq!(looping, vec![2]);

    run_until(&mut machine, 3.0);
    // Only the hat's repeats at 2.3 s and 2.8 s
    assert_eq!(started(&machine), 10);
}

#[test]
fn voices_fall_silent_after_their_lifetime() {
    let mut machine = machine();
    let kick = machine.kit().pad(0).unwrap().clone();
    let lifetime = f64::from(kick.duration() + beatpad::synth::VOICE_TAIL);

    machine.trigger_pad(0, 0.0).unwrap();
    let out = run_until(&mut machine, lifetime + 0.2);

    assert_eq!(machine.stats().map(|s| s.active()), Some(0));
    let end = ((lifetime + 0.01) * f64::from(SAMPLE_RATE)) as usize;
    assert!(out[..end].iter().any(|s| s.abs() > 1e-3));
    assert!(out[end..].iter().all(|s| s.abs() < 1e-6));
}

#[test]
fn bent_triggers_and_recording_reach_the_tap() {
    let mut machine = machine();
    machine.start_recording().unwrap();
    machine.trigger_pad(5, 7.0).unwrap();
    run_until(&mut machine, 0.5);
    // Collect the last block
    machine.tick().unwrap();

    assert!(machine.is_recording());
    let take = machine.take();
    assert_eq!(take.len(), 24_000);
    assert!(take.iter().any(|s| s.abs() > 1e-3));
}

#[test]
fn restarting_a_transport_does_not_flam() {
    let downbeat = || {
        SequencerPattern::new("down", "Down", 120)
            .unwrap()
            .with_row(0, row("x..............."))
    };

    let mut machine = machine();
    machine.load_pattern(downbeat());
    machine.start_sequencer().unwrap();
    machine.tick().unwrap();
    machine.backend_mut().render(480);
    machine.start_sequencer().unwrap();
    run_until(&mut machine, 1.0);
    assert_eq!(started(&machine), 1);

    let mut machine = self::machine();
    machine.add_pattern(downbeat());
    let song = || SongArrangement::new("song", "Song").section(SongSection::new("a", "A", "down", 1));
    machine.start_song(song()).unwrap();
    machine.tick().unwrap();
    machine.backend_mut().render(480);
    machine.start_song(song()).unwrap();
    run_until(&mut machine, 1.0);
    assert_eq!(started(&machine), 1);
}
