use crate::dsp::distortion::{saturate_buffer, soft_clip_buffer};
use crate::dsp::mix::apply_dry_wet;
use crate::graph::node::{GraphNode, RenderCtx};
use crate::MAX_BLOCK_SIZE;

/*
Distortion Node
===============

Waveshaping inserted after a voice's oscillator.

Modes
-----

Saturate:  Asymmetric tube-style curve. Adds even harmonics, so a kick or
           bass gets thicker without sounding fuzzy. Kicks drive harder
           than basses.

SoftClip:  Symmetric x / (1 + |x|). Used as crunch on the gunshot effect.

Drive 1.0 is clean, 2-4 warm, 5+ obviously distorted. Mix blends the
shaped signal with the dry one.

  let kick = OscNode::sine()
      .with_sweep(pitch_drop)
      .through(DistortionNode::saturate(4.0))
      .amplify(EnvNode::percussive(0.001, 0.4));
*/

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DistortionMode {
    Saturate,
    SoftClip,
}

pub struct DistortionNode {
    mode: DistortionMode,
    drive: f32,
    mix: f32,
    dry_buffer: [f32; MAX_BLOCK_SIZE],
}

impl DistortionNode {
    fn new(mode: DistortionMode, drive: f32) -> Self {
        Self {
            mode,
            drive: drive.max(1.0),
            mix: 1.0,
            dry_buffer: [0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn saturate(drive: f32) -> Self {
        Self::new(DistortionMode::Saturate, drive)
    }

    pub fn soft_clip(drive: f32) -> Self {
        Self::new(DistortionMode::SoftClip, drive)
    }

    pub fn with_mix(mut self, mix: f32) -> Self {
        self.mix = mix.clamp(0.0, 1.0);
        self
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }
}

impl GraphNode for DistortionNode {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        let len = out.len().min(MAX_BLOCK_SIZE);
        self.dry_buffer[..len].copy_from_slice(&out[..len]);

        match self.mode {
            DistortionMode::Saturate => saturate_buffer(out, self.drive),
            DistortionMode::SoftClip => soft_clip_buffer(out, self.drive),
        }

        apply_dry_wet(&self.dry_buffer[..len], &mut out[..len], self.mix);
    }
}
