//! Parameter automation: scheduled linear and exponential ramps.
//!
//! Every continuously-changing parameter in a voice (oscillator pitch glide,
//! filter sweep) and on the master bus (gain, reverb mix) is expressed as a
//! ramp towards a target rather than an instantaneous jump. Jumps in gain or
//! frequency produce audible clicks; ramps of a few milliseconds do not.
//!
//! # Curves
//!
//! ```text
//! Linear:       v(t) = v0 + (v1 - v0) * t / T
//! Exponential:  v(t) = v0 * (v1 / v0) ^ (t / T)
//! ```
//!
//! Exponential ramps are what the ear hears as "even" for pitch and
//! loudness, so pitch drops and filter sweeps use them. They are computed
//! incrementally: one multiply per sample by `(v1 / v0) ^ (1 / samples)`.
//! Both endpoints must be non-zero and share a sign, so targets are floored
//! at `MIN_EXP_VALUE`.

const MAX_SEGMENTS: usize = 4;
const MIN_EXP_VALUE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    target: f32,
    seconds: f32,
    curve: Curve,
}

/// A short, fixed-capacity automation timeline.
///
/// Segments run back to back from the moment the owning voice starts; after
/// the last one the value holds at its final target.
#[derive(Debug, Clone)]
pub struct Automation {
    initial: f32,
    segments: [Segment; MAX_SEGMENTS],
    len: usize,

    value: f32,
    index: usize,
    remaining: u32,
    step: f32,
    started: bool,
}

impl Automation {
    pub fn constant(value: f32) -> Self {
        Self {
            initial: value,
            segments: [Segment {
                target: value,
                seconds: 0.0,
                curve: Curve::Linear,
            }; MAX_SEGMENTS],
            len: 0,
            value,
            index: 0,
            remaining: 0,
            step: 0.0,
            started: false,
        }
    }

    /// Append an exponential ramp. Extra segments beyond capacity are ignored.
    pub fn exp_to(self, target: f32, seconds: f32) -> Self {
        self.push(target.max(MIN_EXP_VALUE), seconds, Curve::Exponential)
    }

    /// Append a linear ramp.
    pub fn linear_to(self, target: f32, seconds: f32) -> Self {
        self.push(target, seconds, Curve::Linear)
    }

    fn push(mut self, target: f32, seconds: f32, curve: Curve) -> Self {
        if self.len < MAX_SEGMENTS {
            self.segments[self.len] = Segment {
                target,
                seconds: seconds.max(0.0),
                curve,
            };
            self.len += 1;
        }
        self
    }

    /// Total scheduled time of all segments.
    pub fn duration(&self) -> f32 {
        self.segments[..self.len].iter().map(|s| s.seconds).sum()
    }

    /// Final value once every segment has run.
    pub fn final_value(&self) -> f32 {
        if self.len == 0 {
            self.initial
        } else {
            self.segments[self.len - 1].target
        }
    }

    /// Rewind to the start of the timeline.
    pub fn restart(&mut self) {
        self.value = self.initial;
        self.index = 0;
        self.remaining = 0;
        self.started = false;
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_finished(&self) -> bool {
        self.started && self.index >= self.len && self.remaining == 0
    }

    fn enter_segment(&mut self, sample_rate: f32) {
        while self.index < self.len {
            let seg = self.segments[self.index];
            let samples = (seg.seconds * sample_rate).round() as u32;
            if samples == 0 {
                self.value = seg.target;
                self.index += 1;
                continue;
            }

            self.remaining = samples;
            self.step = match seg.curve {
                Curve::Linear => (seg.target - self.value) / samples as f32,
                Curve::Exponential => {
                    let from = if self.value.abs() < MIN_EXP_VALUE {
                        MIN_EXP_VALUE
                    } else {
                        self.value
                    };
                    self.value = from;
                    (seg.target / from).powf(1.0 / samples as f32)
                }
            };
            return;
        }
    }

    /// Current value, then advance one sample.
    #[inline]
    pub fn next(&mut self, sample_rate: f32) -> f32 {
        if !self.started {
            self.started = true;
            self.enter_segment(sample_rate);
        }

        let out = self.value;

        if self.remaining > 0 {
            let seg = self.segments[self.index];
            match seg.curve {
                Curve::Linear => self.value += self.step,
                Curve::Exponential => self.value *= self.step,
            }
            self.remaining -= 1;
            if self.remaining == 0 {
                // Land exactly on the target to avoid accumulated error
                self.value = seg.target;
                self.index += 1;
                self.enter_segment(sample_rate);
            }
        }

        out
    }
}

/// Click-free control value for parameters written from the control thread.
///
/// Each new target restarts a linear ramp from wherever the value currently
/// is, so rapid successive writes never produce a step.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    value: f32,
    target: f32,
    step: f32,
    remaining: u32,
    ramp_samples: u32,
}

impl SmoothedParam {
    pub fn new(value: f32, ramp_seconds: f32, sample_rate: f32) -> Self {
        Self {
            value,
            target: value,
            step: 0.0,
            remaining: 0,
            ramp_samples: (ramp_seconds * sample_rate).round().max(1.0) as u32,
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
        self.remaining = self.ramp_samples;
        self.step = (target - self.value) / self.ramp_samples as f32;
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.value += self.step;
            self.remaining -= 1;
            if self.remaining == 0 {
                self.value = self.target;
            }
        }
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    #[test]
    fn exponential_ramp_lands_on_target() {
        let mut auto = Automation::constant(200.0).exp_to(50.0, 0.1);
        let mut last = 0.0;
        for _ in 0..100 {
            last = auto.next(SAMPLE_RATE);
        }
        assert!((last - 50.0).abs() < 1.0, "got {last}");
        assert!((auto.next(SAMPLE_RATE) - 50.0).abs() < 1e-4);
        assert!(auto.is_finished());
    }

    #[test]
    fn exponential_ramp_halves_at_midpoint_in_log_space() {
        let mut auto = Automation::constant(400.0).exp_to(100.0, 0.1);
        for _ in 0..50 {
            auto.next(SAMPLE_RATE);
        }
        // Halfway in time is the geometric mean: sqrt(400 * 100) = 200
        assert!((auto.value() - 200.0).abs() < 2.0, "got {}", auto.value());
    }

    #[test]
    fn segments_run_back_to_back() {
        let mut auto = Automation::constant(0.0)
            .linear_to(1.0, 0.01)
            .linear_to(0.5, 0.01);
        assert!((auto.duration() - 0.02).abs() < 1e-6);

        for _ in 0..10 {
            auto.next(SAMPLE_RATE);
        }
        assert!((auto.value() - 1.0).abs() < 1e-6);
        for _ in 0..10 {
            auto.next(SAMPLE_RATE);
        }
        assert!((auto.value() - 0.5).abs() < 1e-6);
        assert_eq!(auto.final_value(), 0.5);
    }

    #[test]
    fn smoothed_param_never_steps() {
        let mut param = SmoothedParam::new(1.0, 0.005, 48_000.0);
        param.set_target(0.0);

        let mut previous = 1.0;
        for _ in 0..300 {
            let v = param.next();
            assert!((previous - v).abs() < 0.01, "jump from {previous} to {v}");
            previous = v;
        }
        assert_eq!(param.next(), 0.0);
    }
}
