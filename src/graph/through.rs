use crate::graph::node::{GraphNode, RenderCtx};

/*
Serial Processing
=================

`source.through(effect)` renders the source into the buffer, then lets the
effect process that buffer in place:

    ┌────────┐     ┌────────┐
    │ source │ ──→ │ effect │ ──→ out
    └────────┘     └────────┘

Effects (filters, saturation) have no notion of "done"; whether the chain is
still sounding is decided by the source.
*/

pub struct Through<S, F> {
    source: S,
    effect: F,
}

impl<S, F> Through<S, F> {
    pub fn new(source: S, effect: F) -> Self {
        Self { source, effect }
    }
}

impl<S: GraphNode, F: GraphNode> GraphNode for Through<S, F> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source.render_block(out, ctx);
        self.effect.render_block(out, ctx);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.source.note_on(ctx);
        self.effect.note_on(ctx);
    }

    fn is_active(&self) -> bool {
        self.source.is_active()
    }

    fn get_envelope_level(&self) -> Option<f32> {
        self.source.get_envelope_level()
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{
        distortion::DistortionNode, envelope::EnvNode, extensions::NodeExt, filter::FilterNode,
        node::{GraphNode, RenderCtx},
        oscillator::OscNode,
    };

    fn ctx() -> RenderCtx {
        RenderCtx::from_freq(48_000.0, 440.0, 1.0)
    }

    #[test]
    fn renders_source_then_effect() {
        let mut node = OscNode::sine().through(DistortionNode::saturate(4.0));
        let mut buffer = vec![1.0; 128];
        node.render_block(&mut buffer, &ctx());

        assert!(buffer.iter().any(|&sample| sample != 1.0));
        assert!(buffer.iter().all(|&sample| sample.is_finite()));
    }

    #[test]
    fn activity_follows_the_source() {
        let mut node = OscNode::noise()
            .amplify(EnvNode::percussive(0.001, 0.01))
            .through(FilterNode::highpass(7_500.0));
        let ctx = ctx();

        node.note_on(&ctx);
        assert!(node.is_active());
        assert!(node.get_envelope_level().is_some());

        let mut buffer = vec![0.0; 1_024];
        node.render_block(&mut buffer, &ctx);
        assert!(!node.is_active(), "a 10 ms hit is over after 1024 samples");
    }
}
