use crate::{
    graph::node::{GraphNode, RenderCtx},
    MAX_BLOCK_SIZE,
};

/// `signal × modulator`, sample by sample.
///
/// With an envelope as modulator this is the voice's VCA, and the node is
/// active exactly as long as the envelope is.
pub struct Amplify<N, M> {
    pub signal: N,
    pub modulator: M,
    temp_buffer: Vec<f32>,
}

impl<N, M> Amplify<N, M> {
    pub fn new(signal: N, modulator: M) -> Self {
        Self {
            signal,
            modulator,
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }
}

impl<N: GraphNode, M: GraphNode> GraphNode for Amplify<N, M> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.signal.render_block(out, ctx);

        let frames = &mut self.temp_buffer[..out.len()];
        frames.fill(0.0);
        self.modulator.render_block(frames, ctx);

        for (o, m) in out.iter_mut().zip(frames.iter()) {
            *o *= *m;
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.signal.note_on(ctx);
        self.modulator.note_on(ctx);
    }

    fn get_envelope_level(&self) -> Option<f32> {
        self.modulator.get_envelope_level()
    }

    fn is_active(&self) -> bool {
        self.modulator.is_active()
    }
}

/// Fixed gain applied to a node's output.
pub struct Gain<N> {
    pub node: N,
    pub gain: f32,
}

impl<N> Gain<N> {
    pub fn new(node: N, gain: f32) -> Self {
        Self { node, gain }
    }
}

impl<N: GraphNode> GraphNode for Gain<N> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.node.render_block(out, ctx);
        for sample in out.iter_mut() {
            *sample *= self.gain;
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.node.note_on(ctx);
    }

    fn get_envelope_level(&self) -> Option<f32> {
        self.node.get_envelope_level()
    }

    fn is_active(&self) -> bool {
        self.node.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{envelope::EnvNode, extensions::NodeExt, oscillator::OscNode};

    #[test]
    fn envelope_gates_activity() {
        let ctx = RenderCtx::from_freq(1_000.0, 100.0, 1.0);
        let mut voice = OscNode::sine().amplify(EnvNode::percussive(0.001, 0.05));
        assert!(!voice.is_active());

        voice.note_on(&ctx);
        assert!(voice.is_active());

        let mut buffer = vec![0.0; 100];
        voice.render_block(&mut buffer, &ctx);
        assert!(!voice.is_active());
        assert!(buffer[90..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn gain_scales_output() {
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);
        let mut plain = OscNode::sine();
        let mut halved = OscNode::sine().gain(0.5);

        let mut a = vec![0.0; 64];
        let mut b = vec![0.0; 64];
        plain.render_block(&mut a, &ctx);
        halved.render_block(&mut b, &ctx);

        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x * 0.5 - y).abs() < 1e-6);
        }
    }
}
