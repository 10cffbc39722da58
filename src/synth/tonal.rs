//! Pitched melodic voices: the synth pluck and the chord stabs used by
//! composite loops.
//!
//! # How It Works
//!
//! 1. Sawtooth oscillator: every harmonic, so there is something to filter
//! 2. Low-pass whose cutoff falls from 6× to 1.2× the note over the note's
//!    length; the sound starts bright and closes, which reads as "plucked"
//! 3. Short attack (5 ms) and exponential release

use crate::dsp::automation::Automation;
use crate::graph::{envelope::EnvNode, extensions::NodeExt, filter::FilterNode, oscillator::OscNode};

use super::drums::with_transient;
use super::voice::{Tone, Voice};

const PLUCK_ATTACK: f32 = 0.005;
const SWEEP_START: f32 = 6.0;
const SWEEP_END: f32 = 1.2;

pub fn pluck(tone: &Tone) -> Voice {
    let sweep = Automation::constant(tone.frequency * SWEEP_START)
        .exp_to(tone.frequency * SWEEP_END, tone.duration());

    let node = OscNode::sawtooth()
        .with_frequency(tone.frequency)
        .through(FilterNode::lowpass(tone.frequency * SWEEP_START).with_sweep(sweep))
        .amplify(EnvNode::percussive(PLUCK_ATTACK, tone.volume_decay))
        .boxed();

    Voice::new(with_transient(node, tone), tone)
}

/// A soft, short chord tone.
pub fn stab(frequency: f32, length: f32) -> Voice {
    let tone = Tone::new(frequency, length, length);
    let sweep = Automation::constant(frequency * 4.0).exp_to(frequency * 1.5, length);

    let node = OscNode::sawtooth()
        .with_frequency(frequency)
        .mix(OscNode::square().with_frequency(frequency * 0.5), 0.3)
        .through(FilterNode::lowpass(frequency * 4.0).with_resonance(0.2).with_sweep(sweep))
        .amplify(EnvNode::percussive(0.01, length))
        .boxed();

    Voice::new(node, &tone)
}
