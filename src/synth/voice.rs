use crate::dsp::oscillator::OscillatorWaveform;
use crate::graph::node::{GraphNode, RenderCtx};
use crate::kit::{PadConfig, Waveform};

/// Safety margin added to every voice's lifetime, in seconds.
pub const VOICE_TAIL: f32 = 0.05;

impl From<Waveform> for OscillatorWaveform {
    fn from(waveform: Waveform) -> Self {
        match waveform {
            Waveform::Sine => OscillatorWaveform::Sine,
            Waveform::Square => OscillatorWaveform::Square,
            Waveform::Sawtooth => OscillatorWaveform::Saw,
            Waveform::Triangle => OscillatorWaveform::Triangle,
        }
    }
}

/// The numeric parameters a generator works from.
///
/// Pads produce one after applying pitch bend; composite loops build their
/// own for the drums and stabs they schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency: f32,
    pub pitch_decay: f32,
    pub volume_decay: f32,
    pub waveform: Waveform,
    pub noise: bool,
    pub distortion: bool,
}

impl Tone {
    pub fn from_pad(pad: &PadConfig, bend_semitones: f32) -> Self {
        Self {
            frequency: pad.effective_frequency(bend_semitones),
            pitch_decay: pad.pitch_decay(),
            volume_decay: pad.volume_decay(),
            waveform: pad.waveform(),
            noise: pad.mix_in_noise(),
            distortion: pad.apply_distortion(),
        }
    }

    pub const fn new(frequency: f32, pitch_decay: f32, volume_decay: f32) -> Self {
        Self {
            frequency,
            pitch_decay,
            volume_decay,
            waveform: Waveform::Sine,
            noise: false,
            distortion: false,
        }
    }

    pub const fn waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub const fn distorted(mut self) -> Self {
        self.distortion = true;
        self
    }

    pub fn duration(&self) -> f32 {
        self.pitch_decay.max(self.volume_decay)
    }
}

/// A scheduled sound: a graph plus its hard lifetime.
///
/// The render path calls `start` once at the voice's start frame, then
/// `render` every block until `is_finished`.
pub struct Voice {
    node: Box<dyn GraphNode>,
    frequency: f32,
    velocity: f32,
    /// Hard lifetime in seconds
    duration: f32,

    remaining: usize,
    started: bool,
}

impl Voice {
    pub fn new(node: Box<dyn GraphNode>, tone: &Tone) -> Self {
        Self {
            node,
            frequency: tone.frequency,
            velocity: 1.0,
            duration: tone.duration() + VOICE_TAIL,
            remaining: 0,
            started: false,
        }
    }

    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = velocity.clamp(0.0, 1.0);
        self
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    fn ctx(&self, sample_rate: f32) -> RenderCtx {
        RenderCtx::from_freq(sample_rate, self.frequency, self.velocity)
    }

    pub fn start(&mut self, sample_rate: f32) {
        let ctx = self.ctx(sample_rate);
        self.node.note_on(&ctx);
        self.remaining = (self.duration * sample_rate).ceil() as usize;
        self.started = true;
    }

    /// Add this voice's next `out.len()` samples into `out`.
    ///
    /// `scratch` must be at least as long as `out`.
    pub fn render_into(&mut self, out: &mut [f32], scratch: &mut [f32], sample_rate: f32) {
        let len = out.len().min(self.remaining);
        if len == 0 {
            return;
        }

        let ctx = self.ctx(sample_rate);
        let block = &mut scratch[..len];
        block.fill(0.0);
        self.node.render_block(block, &ctx);

        for (o, s) in out.iter_mut().zip(block.iter()) {
            *o += *s;
        }
        self.remaining -= len;
    }

    pub fn is_finished(&self) -> bool {
        self.started && (self.remaining == 0 || !self.node.is_active())
    }
}
