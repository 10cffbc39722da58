//! Voice Synthesis Engine.
//!
//! `synthesize` turns one pad press into one or more scheduled `Voice`s.
//! It never fails: pad parameters were range-checked when the pad was
//! built, and the generator was chosen then too (`PadConfig::voicing`).
//!
//! ```text
//!   PadConfig ──→ Tone (bend applied) ──→ generator ──→ Voice ──→ sink.schedule(at, voice)
//!                                          │
//!                       Loop(style) ───────┴──→ many voices, same sink
//! ```

pub mod drums;
pub mod fx;
pub mod loops;
pub mod tonal;
pub mod voice;

pub use voice::{Tone, Voice, VOICE_TAIL};

use tracing::debug;

use crate::kit::{PadConfig, Voicing};

/// Where generated voices go.
///
/// Implemented by the engine's bus port (which stamps each voice with its
/// source and converts the start time to a frame) and by test collectors.
pub trait VoiceSink {
    /// Current tempo; composite loops derive their 16th-note grid from it.
    fn tempo(&self) -> f64;

    /// Queue `voice` to start at `at` seconds on the audio clock.
    fn schedule(&mut self, at: f64, voice: Voice);
}

/// Schedule the sound for `pad` at `start`, pitched by `bend_semitones`.
pub fn synthesize<S: VoiceSink + ?Sized>(
    pad: &PadConfig,
    start: f64,
    bend_semitones: f32,
    sink: &mut S,
) {
    debug!(pad = pad.id(), label = pad.label(), start, "synthesize");

    let tone = Tone::from_pad(pad, bend_semitones);
    let voice = match pad.voicing() {
        Voicing::Kick => drums::kick(&tone),
        Voicing::Bass => drums::bass(&tone),
        Voicing::Snare => drums::snare(&tone),
        Voicing::Clap => drums::clap(&tone),
        Voicing::HiHat => drums::hihat(&tone),
        Voicing::Synth => tonal::pluck(&tone),
        Voicing::Fx(kind) => fx::fx(kind, &tone),
        Voicing::Loop(style) => {
            loops::schedule(style, pad, start, bend_semitones, sink);
            return;
        }
    };
    sink.schedule(start, voice);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::factory_kit;

    #[derive(Default)]
    struct Collect {
        voices: Vec<(f64, Voice)>,
    }

    impl VoiceSink for Collect {
        fn tempo(&self) -> f64 {
            120.0
        }

        fn schedule(&mut self, at: f64, voice: Voice) {
            self.voices.push((at, voice));
        }
    }

    #[test]
    fn one_shot_pads_schedule_one_voice_at_start() {
        let kit = factory_kit();
        for pad in kit.pads().iter().filter(|pad| !pad.is_loop()) {
            let mut sink = Collect::default();
            synthesize(pad, 1.5, 0.0, &mut sink);

            assert_eq!(sink.voices.len(), 1, "pad {}", pad.label());
            let (at, voice) = &sink.voices[0];
            assert_eq!(*at, 1.5);
            assert!((voice.duration() - (pad.duration() + VOICE_TAIL)).abs() < 1e-6);
        }
    }

    #[test]
    fn loop_pads_schedule_many_voices() {
        let kit = factory_kit();
        for pad in kit.pads().iter().filter(|pad| pad.is_loop()) {
            let mut sink = Collect::default();
            synthesize(pad, 0.0, 0.0, &mut sink);
            assert!(sink.voices.len() > 16, "pad {}", pad.label());
        }
    }

    #[test]
    fn every_voice_renders_silence_after_its_lifetime() {
        const SAMPLE_RATE: f32 = 48_000.0;
        let kit = factory_kit();
        let mut scratch = vec![0.0; crate::MAX_BLOCK_SIZE];

        for pad in kit.pads().iter().filter(|pad| !pad.is_loop()) {
            let mut sink = Collect::default();
            synthesize(pad, 0.0, 0.0, &mut sink);
            let Some((_, mut voice)) = sink.voices.pop() else {
                panic!("no voice for {}", pad.label());
            };

            let lifetime = voice.duration();
            let mut out = vec![0.0; ((lifetime + 0.2) * SAMPLE_RATE) as usize];
            voice.start(SAMPLE_RATE);
            for chunk in out.chunks_mut(crate::MAX_BLOCK_SIZE) {
                voice.render_into(chunk, &mut scratch, SAMPLE_RATE);
            }

            let end = (lifetime * SAMPLE_RATE).ceil() as usize + 1;
            assert!(out[end..].iter().all(|s| *s == 0.0), "pad {}", pad.label());
            assert!(out.iter().all(|s| s.is_finite()), "pad {}", pad.label());
            assert!(voice.is_finished());
        }
    }
}
