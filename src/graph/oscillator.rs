use crate::dsp::{
    automation::Automation,
    oscillator::{OscillatorBlock, OscillatorWaveform},
};
use crate::graph::node::{GraphNode, RenderCtx};

/*
Audio Oscillator
================

The raw sound source of every pitched voice. Which waveform a pad uses
decides most of its character:

  Sine      fundamental only. Sub kicks and 808-style basses.
  Triangle  weak odd harmonics. Snare bodies, soft tones.
  Square    strong odd harmonics. Hollow, woody basses.
  Sawtooth  every harmonic. Bright plucks, buzzy basses.
  Noise     no pitch at all. Hats, snare wires, claps, risers.

Pitch Sweeps
------------

A kick is not a static tone: it starts high and drops fast, which the ear
hears as the "punch". Sweeps are driven by an `Automation` evaluated once
per sample:

  freq (Hz)
   150 ┐╲
       │ ╲
       │  ╲___
    45 │      ╲__________   (holds at the floor)
       └──────────────────→ time
         pitch_decay

Without a sweep the node plays the context frequency, i.e. the voice's
effective pitch after bend.
*/

pub struct OscNode {
    osc: OscillatorBlock,
    sweep: Option<Automation>,
}

impl OscNode {
    fn new(osc: OscillatorBlock) -> Self {
        Self { osc, sweep: None }
    }

    pub fn from_waveform(waveform: OscillatorWaveform) -> Self {
        Self::new(OscillatorBlock::new(waveform))
    }

    pub fn sine() -> Self {
        Self::new(OscillatorBlock::sine())
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorBlock::sawtooth())
    }

    pub fn square() -> Self {
        Self::new(OscillatorBlock::square())
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorBlock::triangle())
    }

    pub fn noise() -> Self {
        Self::new(OscillatorBlock::noise())
    }

    /// Play a fixed frequency instead of the context's.
    pub fn with_frequency(self, freq: f32) -> Self {
        self.with_sweep(Automation::constant(freq))
    }

    /// Drive the frequency from an automation timeline.
    pub fn with_sweep(mut self, sweep: Automation) -> Self {
        self.sweep = Some(sweep);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.osc = self.osc.with_seed(seed);
        self
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        match self.sweep.as_mut() {
            Some(sweep) => {
                for sample in out.iter_mut() {
                    let freq = sweep.next(ctx.sample_rate);
                    *sample = self.osc.next_sample(freq, ctx.sample_rate);
                }
            }
            None => self.osc.render(out, ctx),
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.osc.reset();
        if let Some(sweep) = self.sweep.as_mut() {
            sweep.restart();
        }
    }
}
