//! Kick, bass, snare, clap and hi-hat generators.
//!
//! # How They Work
//!
//! - Kick / Bass: one oscillator whose pitch falls exponentially from the
//!   effective frequency to a floor over `pitch_decay`. The kick starts a
//!   little above its note (the "click" of the beater); the bass does not.
//!   Optional asymmetric saturation, harder on the kick.
//! - Snare: a short triangle "body" in the 150-250 Hz range layered with a
//!   high-passed noise burst (the wires).
//! - Clap: the snare recipe with the noise envelope split into four bursts
//!   10 ms apart, which is what several hands sound like.
//! - Hi-hat: noise through two stacked high-passes near 7.5 kHz. Decays
//!   shorter than 40 ms are lengthened; anything shorter is an inaudible tick.

use crate::dsp::automation::Automation;
use crate::graph::{
    distortion::DistortionNode, envelope::EnvNode, extensions::NodeExt, filter::FilterNode,
    node::GraphNode, oscillator::OscNode,
};

use super::voice::{Tone, Voice};

/// Upward pitch offset at the start of a kick, in Hz.
const KICK_CLICK: f32 = 80.0;
const KICK_DRIVE: f32 = 4.0;
const BASS_DRIVE: f32 = 2.0;
const LOWEST_PITCH: f32 = 20.0;

const SNARE_BODY_RANGE: (f32, f32) = (150.0, 250.0);
const SNARE_NOISE_RANGE: (f32, f32) = (800.0, 1_500.0);
const CLAP_BURSTS: u8 = 4;
const CLAP_SPACING: f32 = 0.01;

const HAT_CUTOFF: f32 = 7_500.0;
const HAT_MIN_DECAY: f32 = 0.04;

/// A few milliseconds of bright noise, layered onto pitched voices.
pub(crate) fn transient() -> impl GraphNode {
    OscNode::noise()
        .through(FilterNode::highpass(2_000.0))
        .amplify(EnvNode::percussive(0.0005, 0.02))
}

/// Add the transient layer when the tone asks for it.
pub(crate) fn with_transient(node: Box<dyn GraphNode>, tone: &Tone) -> Box<dyn GraphNode> {
    if tone.noise {
        node.mix(transient(), 0.25).boxed()
    } else {
        node
    }
}

fn swept_body(tone: &Tone, start: f32, floor: f32, drive: f32, attack: f32) -> Box<dyn GraphNode> {
    let sweep = Automation::constant(start).exp_to(floor, tone.pitch_decay);
    let osc = OscNode::from_waveform(tone.waveform.into()).with_sweep(sweep);
    let env = EnvNode::percussive(attack, tone.volume_decay);

    let body = if tone.distortion {
        osc.through(DistortionNode::saturate(drive)).amplify(env).boxed()
    } else {
        osc.amplify(env).boxed()
    };
    with_transient(body, tone)
}

pub fn kick(tone: &Tone) -> Voice {
    let floor = (tone.frequency * 0.3).max(LOWEST_PITCH);
    let node = swept_body(tone, tone.frequency + KICK_CLICK, floor, KICK_DRIVE, 0.001);
    Voice::new(node, tone)
}

pub fn bass(tone: &Tone) -> Voice {
    let floor = (tone.frequency * 0.5).max(LOWEST_PITCH);
    let node = swept_body(tone, tone.frequency, floor, BASS_DRIVE, 0.003);
    Voice::new(node, tone)
}

fn snare_body(tone: &Tone) -> impl GraphNode {
    let pitch = tone.frequency.clamp(SNARE_BODY_RANGE.0, SNARE_BODY_RANGE.1);
    let sweep = Automation::constant(pitch).exp_to(pitch * 0.8, tone.pitch_decay);

    OscNode::triangle()
        .with_sweep(sweep)
        // The body is always shorter than the wires
        .amplify(EnvNode::percussive(0.001, (tone.volume_decay * 0.4).max(0.02)))
}

fn snare_cutoff(tone: &Tone) -> f32 {
    (tone.frequency * 5.0).clamp(SNARE_NOISE_RANGE.0, SNARE_NOISE_RANGE.1)
}

pub fn snare(tone: &Tone) -> Voice {
    let wires = OscNode::noise()
        .through(FilterNode::highpass(snare_cutoff(tone)))
        .amplify(EnvNode::percussive(0.001, tone.volume_decay));

    let node = snare_body(tone).mix(wires, 0.6).boxed();
    Voice::new(node, tone)
}

pub fn clap(tone: &Tone) -> Voice {
    let bursts = OscNode::noise()
        .through(FilterNode::highpass(snare_cutoff(tone)))
        .amplify(EnvNode::bursts(CLAP_BURSTS, CLAP_SPACING, tone.volume_decay));

    let node = snare_body(tone).mix(bursts, 0.8).boxed();
    Voice::new(node, tone)
}

pub fn hihat(tone: &Tone) -> Voice {
    let node = OscNode::noise()
        // Two 12 dB/oct stages for a steep slope
        .through(FilterNode::highpass(HAT_CUTOFF))
        .through(FilterNode::highpass(HAT_CUTOFF))
        .amplify(EnvNode::percussive(0.0005, tone.volume_decay.max(HAT_MIN_DECAY)))
        .gain(1.5)
        .boxed();
    Voice::new(node, tone)
}
