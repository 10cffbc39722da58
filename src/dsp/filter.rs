use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

/*
| type              | constructed by       | passes          | rejects      |
| ----------------- | -------------------- | --------------- | ------------ |
| low-pass          | LPF                  | below cutoff    | above cutoff |
| high-pass         | HPF                  | above cutoff    | below cutoff |
| band-pass         | LPF ∘ HPF (series)   | between cutoffs | outside      |

Cutoff is clamped below Nyquist: the bilinear pre-warp `tan(PI * fc / sr)`
blows up at `fc = sr / 2`.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
}

pub struct FilterOutputs {
    pub lowpass: f32,
    pub bandpass: f32,
    pub highpass: f32,
}

pub struct SVFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    pub cutoff_hz: f32,
    pub resonance: f32,
    filter_type: FilterType,
}

impl SVFilter {
    pub fn new(filter_type: FilterType, cutoff_hz: f32) -> Self {
        Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz,
            resonance: 0.0,
            filter_type,
        }
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz)
    }

    pub fn highpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff_hz)
    }

    pub fn bandpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::BandPass, cutoff_hz)
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Integrator gain `g` for a cutoff at the given sample rate.
    #[inline]
    pub fn coefficient(cutoff_hz: f32, sample_rate: f32) -> f32 {
        let nyquist_guard = sample_rate * 0.49;
        let fc = cutoff_hz.clamp(10.0, nyquist_guard);
        (PI * fc / sample_rate).tan()
    }

    /// Damping `k` from resonance (0 = gentle, approaching 1 = ringing).
    #[inline]
    pub fn damping(&self) -> f32 {
        2.0 - (2.0 * self.resonance.clamp(0.0, 0.98))
    }

    pub fn next_sample(&mut self, sample: f32, k: f32, g: f32) -> FilterOutputs {
        let h = 1.0 / (1.0 + g * (g + k));
        let v3 = sample - self.ic2eq;
        let v1 = h * (self.ic1eq + g * v3);
        let v2 = self.ic2eq + g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        FilterOutputs {
            lowpass: v2,
            bandpass: v1,
            highpass: sample - k * v1 - v2,
        }
    }

    /// Filter one sample with explicit coefficients, returning this filter's response.
    #[inline]
    pub fn process(&mut self, sample: f32, k: f32, g: f32) -> f32 {
        let outputs = self.next_sample(sample, k, g);
        match self.filter_type {
            FilterType::LowPass => outputs.lowpass,
            FilterType::HighPass => outputs.highpass,
            FilterType::BandPass => outputs.bandpass,
        }
    }

    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        let g = Self::coefficient(self.cutoff_hz, ctx.sample_rate);
        let k = self.damping();

        for sample in buffer.iter_mut() {
            *sample = self.process(*sample, k, g);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff_hz = cutoff;
    }

    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::OscillatorBlock;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        let mut osc = OscillatorBlock::sine();
        let ctx = RenderCtx::from_freq(sample_rate, freq, 1.0);
        let mut buffer = vec![0.0f32; len];
        osc.render(&mut buffer, &ctx);
        buffer
    }

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len().min(64);
        buffer[skip..].iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn test_lowpass_basic() {
        let mut filter = SVFilter::lowpass(500.0);
        let mut buffer = vec![1.0; 256];
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 100.0);

        filter.render(&mut buffer, &ctx);

        assert!(buffer[255] > 0.99);
    }

    #[test]
    fn test_highpass_basic() {
        let mut filter = SVFilter::highpass(500.0);
        let mut buffer = vec![1.0; 256];
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 100.0);

        filter.render(&mut buffer, &ctx);

        assert!(buffer[255].abs() < 0.001);
    }

    #[test]
    fn test_lowpass_filters_high_freq() {
        let sample_rate = 48_000.0;
        let ctx = RenderCtx::from_freq(sample_rate, 5_000.0, 100.0);
        let mut buffer = sine(5_000.0, sample_rate, 512);

        let mut filter = SVFilter::lowpass(500.0);
        filter.render(&mut buffer, &ctx);

        // 10x above cutoff at 12 dB/octave
        let peak = peak_after_transient(&buffer);
        assert!(peak < 0.05, "Expected high freq attenuation, got peak: {}", peak);
    }

    #[test]
    fn test_highpass_removes_lows() {
        let sample_rate = 48_000.0;
        let ctx = RenderCtx::from_freq(sample_rate, 100.0, 100.0);
        let mut buffer = sine(100.0, sample_rate, 2048);

        let mut filter = SVFilter::highpass(7_500.0);
        filter.render(&mut buffer, &ctx);

        let peak = peak_after_transient(&buffer);
        assert!(peak < 0.01, "got {peak}");
    }

    #[test]
    fn test_bandpass_emphasizes_cutoff_frequency() {
        let sample_rate = 48_000.0;
        let cutoff = 1_000.0;

        let mut filter = SVFilter::bandpass(cutoff);
        filter.set_resonance(0.5);

        let ctx_pass = RenderCtx::from_freq(sample_rate, cutoff, 100.0);
        let mut pass_buffer = sine(cutoff, sample_rate, 1024);
        filter.render(&mut pass_buffer, &ctx_pass);
        let pass_peak = peak_after_transient(&pass_buffer);

        filter.reset();
        let ctx_off = RenderCtx::from_freq(sample_rate, 100.0, 100.0);
        let mut off_buffer = sine(100.0, sample_rate, 1024);
        filter.render(&mut off_buffer, &ctx_off);
        let off_peak = peak_after_transient(&off_buffer);

        assert!(
            pass_peak > off_peak * 2.0,
            "expected bandpass to emphasize cutoff freq, got pass_peak={}, off_peak={}",
            pass_peak,
            off_peak
        );
    }

    #[test]
    fn cutoff_at_nyquist_stays_finite() {
        let mut filter = SVFilter::lowpass(30_000.0);
        let mut buffer = vec![1.0; 64];
        filter.render(&mut buffer, &RenderCtx::from_freq(48_000.0, 0.0, 1.0));
        assert!(buffer.iter().all(|s| s.is_finite()));
    }
}
