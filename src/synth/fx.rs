//! Hand-built effect instruments.
//!
//! These are fixed recipes; the pad only decides their pitch and length.
//!
//! - Gunshot: a low sine thud plus a noise crack whose low-pass closes
//!   quickly, the two soft-clipped together
//! - Tape stop: the pad's oscillator sliding down to nearly nothing, with a
//!   bed of dull hiss fading underneath
//! - Scratch: noise through a resonant band-pass swept up, back down, and up
//!   again, like a record pushed back and forth
//! - Noise: a filtered white-noise riser that swells and then cuts off

use crate::dsp::automation::Automation;
use crate::graph::{
    distortion::DistortionNode, envelope::EnvNode, extensions::NodeExt, filter::FilterNode,
    oscillator::OscNode,
};
use crate::kit::FxKind;

use super::voice::{Tone, Voice};

pub fn fx(kind: FxKind, tone: &Tone) -> Voice {
    match kind {
        FxKind::Gunshot => gunshot(tone),
        FxKind::TapeStop => tape_stop(tone),
        FxKind::Scratch => scratch(tone),
        FxKind::Noise => riser(tone),
    }
}

fn gunshot(tone: &Tone) -> Voice {
    let length = tone.duration();

    let thud = OscNode::sine()
        .with_sweep(Automation::constant(tone.frequency * 2.0).exp_to(tone.frequency * 0.5, 0.1))
        .amplify(EnvNode::percussive(0.001, (length * 0.5).max(0.05)));

    let crack = OscNode::noise()
        .through(FilterNode::lowpass(8_000.0).with_sweep(
            Automation::constant(8_000.0).exp_to(500.0, length),
        ))
        .amplify(EnvNode::percussive(0.0005, length));

    let node = thud
        .mix(crack, 0.5)
        .through(DistortionNode::soft_clip(3.0))
        .boxed();
    Voice::new(node, tone)
}

fn tape_stop(tone: &Tone) -> Voice {
    let slide = Automation::constant(tone.frequency).exp_to(20.0, tone.pitch_decay);

    let voice = OscNode::from_waveform(tone.waveform.into())
        .with_sweep(slide)
        .amplify(EnvNode::percussive(0.01, tone.volume_decay));

    let hiss = OscNode::noise()
        .through(FilterNode::lowpass(3_000.0))
        .amplify(EnvNode::percussive(0.001, tone.volume_decay));

    Voice::new(voice.mix(hiss, 0.15).boxed(), tone)
}

fn scratch(tone: &Tone) -> Voice {
    let third = tone.duration() / 3.0;
    let sweep = Automation::constant(tone.frequency * 0.5)
        .exp_to(tone.frequency * 3.0, third)
        .exp_to(tone.frequency * 0.8, third)
        .exp_to(tone.frequency * 2.0, third);

    let node = OscNode::noise()
        .through(FilterNode::bandpass(tone.frequency).with_resonance(0.6).with_sweep(sweep))
        .amplify(EnvNode::percussive(0.005, tone.volume_decay))
        .gain(2.0)
        .boxed();
    Voice::new(node, tone)
}

fn riser(tone: &Tone) -> Voice {
    let length = tone.duration();
    let sweep = Automation::constant(500.0).exp_to(8_000.0, length);

    let node = OscNode::noise()
        .through(FilterNode::lowpass(500.0).with_sweep(sweep))
        // Long swell, quick cut
        .amplify(EnvNode::percussive(length * 0.75, length * 0.25))
        .boxed();
    Voice::new(node, tone)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn render(mut voice: Voice) -> Vec<f32> {
        let len = ((voice.duration() + 0.05) * SAMPLE_RATE) as usize;
        let mut out = vec![0.0; len];
        let mut scratch = vec![0.0; crate::MAX_BLOCK_SIZE];
        voice.start(SAMPLE_RATE);
        for chunk in out.chunks_mut(crate::MAX_BLOCK_SIZE) {
            voice.render_into(chunk, &mut scratch, SAMPLE_RATE);
        }
        out
    }

    fn rms(buffer: &[f32]) -> f32 {
        (buffer.iter().map(|x| x * x).sum::<f32>() / buffer.len().max(1) as f32).sqrt()
    }

    #[test]
    fn every_fx_makes_sound_and_stays_finite() {
        let tone = Tone::new(220.0, 0.5, 0.5);
        for kind in [FxKind::Gunshot, FxKind::TapeStop, FxKind::Scratch, FxKind::Noise] {
            let out = render(fx(kind, &tone));
            assert!(out.iter().all(|s| s.is_finite()), "{kind:?}");
            assert!(rms(&out) > 0.01, "{kind:?} is silent");
        }
    }

    #[test]
    fn riser_swells() {
        let tone = Tone::new(1_000.0, 1.0, 1.0);
        let out = render(fx(FxKind::Noise, &tone));
        let early = rms(&out[..4_800]);
        let late = rms(&out[33_600..36_000]);
        assert!(late > early * 3.0, "early={early} late={late}");
    }
}
