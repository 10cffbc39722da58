use crate::{
    dsp::{automation::Automation, filter::SVFilter},
    graph::node::{GraphNode, RenderCtx},
};

/*
Filter Node
===========

Wraps the state-variable filter with an optional cutoff sweep.

  - hats: two cascaded high-passes at a fixed 7.5 kHz (24 dB/oct total)
  - snare wires: high-passed noise so the burst sits above the body
  - synth pluck: low-pass that closes from 6× to ~1.2× the note frequency,
    the classic "pluck" shape

A fixed cutoff computes its coefficient once per block; a swept cutoff
recomputes it every sample (one `tan` per sample, only for voices that
actually sweep).
*/

pub struct FilterNode {
    filter: SVFilter,
    sweep: Option<Automation>,
}

impl FilterNode {
    fn new(filter: SVFilter) -> Self {
        Self {
            filter,
            sweep: None,
        }
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(SVFilter::lowpass(cutoff_hz))
    }

    pub fn highpass(cutoff_hz: f32) -> Self {
        Self::new(SVFilter::highpass(cutoff_hz))
    }

    pub fn bandpass(cutoff_hz: f32) -> Self {
        Self::new(SVFilter::bandpass(cutoff_hz))
    }

    pub fn with_resonance(mut self, resonance: f32) -> Self {
        self.filter.set_resonance(resonance);
        self
    }

    /// Drive the cutoff from an automation timeline.
    pub fn with_sweep(mut self, sweep: Automation) -> Self {
        self.filter.set_cutoff(sweep.final_value());
        self.sweep = Some(sweep);
        self
    }

    #[cfg(test)]
    pub fn cutoff(&self) -> f32 {
        self.filter.cutoff_hz
    }
}

impl GraphNode for FilterNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        match self.sweep.as_mut() {
            Some(sweep) => {
                let k = self.filter.damping();
                for sample in out.iter_mut() {
                    let cutoff = sweep.next(ctx.sample_rate);
                    let g = SVFilter::coefficient(cutoff, ctx.sample_rate);
                    *sample = self.filter.process(*sample, k, g);
                }
            }
            None => self.filter.render(out, ctx),
        }
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.filter.reset();
        if let Some(sweep) = self.sweep.as_mut() {
            sweep.restart();
        }
    }
}
