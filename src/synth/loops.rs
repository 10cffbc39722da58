//! Composite genre loops.
//!
//! A loop pad is a macro: one trigger schedules a whole backing pattern
//! (drums plus chord stabs) across 2-4 bars, at 16th-note positions derived
//! from the sink's current tempo. Every sub-voice goes through the same sink,
//! at its own absolute start time, exactly like a sequencer step would.
//!
//! ```text
//!   BoomBap  kick x......x..x.....  snare ....x.......x...  stabs x.....x.........
//!   House    kick x...x...x...x...  clap  ....x.......x...  stabs ...x.......x....
//!   Trap     sub  x.....x....x....  snare ........x.......  stabs x...............
//!   LoFi     kick x........x......  snare ....x.......x...  stabs x.......x.......
//! ```

use crate::engine::scheduler::step_duration;
use crate::kit::{LoopStyle, PadConfig, Waveform};

use super::{
    drums,
    tonal,
    voice::{Tone, Voice},
    VoiceSink,
};

const STEPS_PER_BAR: u32 = 16;

const KICK: Tone = Tone::new(55.0, 0.1, 0.4).distorted();
const SUB_KICK: Tone = Tone::new(45.0, 0.25, 0.7);
const SNARE: Tone = Tone::new(190.0, 0.04, 0.18).waveform(Waveform::Triangle);
const CLAP: Tone = Tone::new(180.0, 0.03, 0.22);
const HAT: Tone = Tone::new(8_000.0, 0.01, 0.045);

#[derive(Clone, Copy)]
enum Part {
    Drum(fn(&Tone) -> Voice, Tone),
    Stab,
}

struct Recipe {
    /// (instrument, step mask, velocity)
    parts: &'static [(Part, u16, f32)],
    /// Root movement per bar, in semitones
    progression: &'static [f32],
    /// Chord intervals over the root
    chord: &'static [f32],
}

/// Steps as a bit mask, step 0 in the highest bit.
const fn steps(pattern: &[u8; 16]) -> u16 {
    let mut mask = 0u16;
    let mut i = 0;
    while i < 16 {
        if pattern[i] == b'x' {
            mask |= 1 << (15 - i);
        }
        i += 1;
    }
    mask
}

const MINOR: &[f32] = &[0.0, 3.0, 7.0];
const MINOR_SEVENTH: &[f32] = &[0.0, 3.0, 7.0, 10.0];

const BOOM_BAP: Recipe = Recipe {
    parts: &[
        (Part::Drum(drums::kick, KICK), steps(b"x......x..x....."), 1.0),
        (Part::Drum(drums::snare, SNARE), steps(b"....x.......x..."), 0.9),
        (Part::Drum(drums::hihat, HAT), steps(b"x.x.x.x.x.x.x.x."), 0.5),
        (Part::Stab, steps(b"x.....x........."), 0.4),
    ],
    progression: &[0.0, 5.0],
    chord: MINOR,
};

const HOUSE: Recipe = Recipe {
    parts: &[
        (Part::Drum(drums::kick, KICK), steps(b"x...x...x...x..."), 1.0),
        (Part::Drum(drums::clap, CLAP), steps(b"....x.......x..."), 0.8),
        (Part::Drum(drums::hihat, HAT), steps(b"..x...x...x...x."), 0.6),
        (Part::Stab, steps(b"...x.......x...."), 0.4),
    ],
    progression: &[0.0, -3.0],
    chord: MINOR_SEVENTH,
};

const TRAP: Recipe = Recipe {
    parts: &[
        (Part::Drum(drums::bass, SUB_KICK), steps(b"x.....x....x...."), 1.0),
        (Part::Drum(drums::snare, SNARE), steps(b"........x......."), 0.9),
        (Part::Drum(drums::hihat, HAT), steps(b"xxxxxxxxxxxxxxxx"), 0.4),
        (Part::Stab, steps(b"x..............."), 0.35),
    ],
    progression: &[0.0, 0.0, -4.0, -2.0],
    chord: MINOR,
};

const LO_FI: Recipe = Recipe {
    parts: &[
        (Part::Drum(drums::kick, KICK), steps(b"x........x......"), 0.8),
        (Part::Drum(drums::snare, SNARE), steps(b"....x.......x..."), 0.6),
        (Part::Drum(drums::hihat, HAT), steps(b"x.x.x.x.x.x.x.x."), 0.3),
        (Part::Stab, steps(b"x.......x......."), 0.35),
    ],
    progression: &[0.0, 5.0, 3.0, -2.0],
    chord: MINOR_SEVENTH,
};

fn recipe(style: LoopStyle) -> &'static Recipe {
    match style {
        LoopStyle::BoomBap => &BOOM_BAP,
        LoopStyle::House => &HOUSE,
        LoopStyle::Trap => &TRAP,
        LoopStyle::LoFi => &LO_FI,
    }
}

/// Length of one pass of the loop, in steps.
pub fn loop_steps(style: LoopStyle) -> u32 {
    style.bars() * STEPS_PER_BAR
}

fn semitones(root: f32, offset: f32) -> f32 {
    root * 2.0_f32.powf(offset / 12.0)
}

/// Schedule one pass of a composite loop starting at `start`.
pub fn schedule<S: VoiceSink + ?Sized>(
    style: LoopStyle,
    pad: &PadConfig,
    start: f64,
    bend_semitones: f32,
    sink: &mut S,
) {
    let recipe = recipe(style);
    let step = step_duration(sink.tempo());
    let root = pad.effective_frequency(bend_semitones);

    for bar in 0..style.bars() {
        let chord_root = semitones(root, recipe.progression[bar as usize % recipe.progression.len()]);

        for index in 0..STEPS_PER_BAR {
            let at = start + f64::from(bar * STEPS_PER_BAR + index) * step;
            let bit = 1u16 << (15 - index);

            for &(part, mask, velocity) in recipe.parts {
                if mask & bit == 0 {
                    continue;
                }
                match part {
                    Part::Stab => {
                        let length = (step * 3.0) as f32;
                        for &interval in recipe.chord {
                            let voice = tonal::stab(semitones(chord_root, interval), length);
                            sink.schedule(at, voice.with_velocity(velocity));
                        }
                    }
                    Part::Drum(generate, tone) => {
                        sink.schedule(at, generate(&tone).with_velocity(velocity))
                    }
                }
            }
        }
    }
}
