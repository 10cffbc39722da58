//! Distortion / Waveshaping
//!
//! Distortion adds harmonics by reshaping the waveform. The "drive" parameter
//! controls how aggressively the signal is pushed into the nonlinear region.
//!
//! # How Waveshaping Works
//!
//! A waveshaper applies a transfer function to each sample:
//!   output = f(input * drive)
//!
//! When drive is low (1.0), the signal stays in the linear region of f()
//! and passes through mostly unchanged. As drive increases, the signal hits
//! the nonlinear parts of f(), creating harmonic distortion.
//!
//! # Transfer Functions
//!
//! Soft Clip:
//!   f(x) = x / (1 + |x|)
//!   - Smooth, warm saturation
//!   - Odd harmonics only (the curve is symmetric)
//!
//! Asymmetric Saturation:
//!   f(x) = soft_clip(x + bias) - soft_clip(bias)
//!   - The bias shifts the operating point so positive and negative halves
//!     bend by different amounts, which adds even harmonics
//!   - Subtracting `soft_clip(bias)` keeps f(0) = 0, so silence stays silent
//!     and no DC step appears when a voice starts
//!   - Output is renormalised so the louder half of a full-scale input
//!     peaks at exactly 1.0
//!
//! # Drive Values
//!
//!   1.0  = Clean (no distortion)
//!   2-4  = Warm saturation
//!   5-10 = Obvious distortion

/// Operating-point offset for the asymmetric curve.
const SATURATION_BIAS: f32 = 0.3;

/// Soft clipping using x / (1 + |x|) transfer function.
#[inline]
pub fn soft_clip(sample: f32, drive: f32) -> f32 {
    let x = sample * drive;
    x / (1.0 + x.abs())
}

/// Asymmetric soft saturation: tube-like, with even harmonics.
#[inline]
pub fn saturate(sample: f32, drive: f32) -> f32 {
    let drive = drive.max(1.0);
    let offset = soft_clip(SATURATION_BIAS, 1.0);
    let shaped = soft_clip(sample * drive + SATURATION_BIAS, 1.0) - offset;

    // The negative half bends less, so it sets the full-scale peak
    let full_scale = (soft_clip(SATURATION_BIAS - drive, 1.0) - offset).abs();
    shaped / full_scale
}

/// Apply soft clipping to an entire buffer in place.
pub fn soft_clip_buffer(buffer: &mut [f32], drive: f32) {
    for sample in buffer.iter_mut() {
        *sample = soft_clip(*sample, drive);
    }
}

/// Apply asymmetric saturation to an entire buffer in place.
pub fn saturate_buffer(buffer: &mut [f32], drive: f32) {
    for sample in buffer.iter_mut() {
        *sample = saturate(*sample, drive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_clip_unity_drive() {
        // f(0.1) = 0.1 / 1.1 ≈ 0.0909
        let output = soft_clip(0.1, 1.0);
        assert!((output - 0.0909).abs() < 0.01);
    }

    #[test]
    fn test_soft_clip_high_drive() {
        // f(10) = 10 / 11 ≈ 0.909
        let output = soft_clip(1.0, 10.0);
        assert!(output > 0.9 && output < 1.0);
    }

    #[test]
    fn saturate_keeps_silence_silent() {
        assert!(saturate(0.0, 4.0).abs() < 1e-6);
    }

    #[test]
    fn saturate_is_asymmetric() {
        let pos = saturate(0.5, 4.0);
        let neg = saturate(-0.5, 4.0);
        assert!((pos + neg).abs() > 0.01, "pos={pos} neg={neg}");
    }

    #[test]
    fn saturate_full_scale_is_unity() {
        for drive in [1.0, 2.0, 4.0, 8.0] {
            let peak = saturate(1.0, drive).abs().max(saturate(-1.0, drive).abs());
            assert!((peak - 1.0).abs() < 1e-5, "drive {drive}: {peak}");
        }
    }

    #[test]
    fn saturate_stays_bounded() {
        for i in -100..=100 {
            let x = i as f32 / 100.0;
            let y = saturate(x, 6.0);
            assert!(y.is_finite() && y.abs() <= 1.0 + 1e-5, "x={x} y={y}");
        }
    }
}
