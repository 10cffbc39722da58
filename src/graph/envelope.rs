use crate::{
    dsp::envelope::Envelope,
    graph::node::{GraphNode, RenderCtx},
};

/// Envelope as a graph node: renders its level scaled by the hit velocity.
///
/// Used as the modulator side of `.amplify()`, so the voice is audible for
/// exactly as long as the envelope is active.
pub struct EnvNode {
    env: Envelope,
}

impl EnvNode {
    pub fn percussive(attack: f32, decay: f32) -> Self {
        Self {
            env: Envelope::percussive(attack, decay),
        }
    }

    pub fn bursts(count: u8, spacing: f32, decay: f32) -> Self {
        Self {
            env: Envelope::bursts(count, spacing, decay),
        }
    }

    pub fn with_peak(mut self, peak: f32) -> Self {
        self.env = self.env.with_peak(peak);
        self
    }

    pub fn duration(&self) -> f32 {
        self.env.duration()
    }
}

impl GraphNode for EnvNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.env.render(out);
        if ctx.velocity != 1.0 {
            for sample in out.iter_mut() {
                *sample *= ctx.velocity;
            }
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.env.note_on(ctx);
    }

    fn get_envelope_level(&self) -> Option<f32> {
        Some(self.env.level())
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_until_note_on() {
        let node = EnvNode::percussive(0.001, 0.1);
        assert!(!node.is_active());
        assert_eq!(node.get_envelope_level(), Some(0.0));
    }

    #[test]
    fn velocity_scales_output() {
        let mut full = EnvNode::percussive(0.001, 0.1);
        let mut soft = EnvNode::percussive(0.001, 0.1);
        let loud_ctx = RenderCtx::from_freq(48_000.0, 0.0, 1.0);
        let soft_ctx = RenderCtx::from_freq(48_000.0, 0.0, 0.5);

        full.note_on(&loud_ctx);
        soft.note_on(&soft_ctx);

        let mut a = vec![0.0; 256];
        let mut b = vec![0.0; 256];
        full.render_block(&mut a, &loud_ctx);
        soft.render_block(&mut b, &soft_ctx);

        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x * 0.5 - y).abs() < 1e-6);
        }
    }
}
