//! Engine configuration.
//!
//! ```ignore
//! let config = EngineConfig::default()
//!     .sample_rate(44_100.0)
//!     .lookahead(0.1)
//!     .master_gain(0.7)
//!     .reverb_mix(0.25);
//! ```

use std::time::Duration;

use crate::dsp::dynamics::CompressorSettings;

/// Reverb impulse parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbSettings {
    /// Impulse length in seconds
    pub duration: f32,
    /// Curve exponent of the tail
    pub decay: f32,
    /// Wet share of the output (0.0 = dry only)
    pub mix: f32,
    /// Noise seed, fixed so bounces are reproducible
    pub seed: u64,
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            duration: 2.0,
            decay: 2.0,
            mix: 0.2,
            seed: 0x5eed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Rate used by offline rendering; live backends report their own
    pub sample_rate: f32,
    /// How far ahead of the clock steps are committed, in seconds
    pub lookahead: f64,
    /// How often the control loop should call `tick`
    pub poll_interval: Duration,
    /// Gap between `start()` and the first step, in seconds
    pub start_delay: f64,
    /// Control → render command queue size
    pub command_capacity: usize,
    /// Voices rendering at once; the oldest is stolen beyond this
    pub max_voices: usize,
    /// Voices waiting for their start frame
    pub max_pending: usize,
    /// Recording tap ring size in samples
    pub tap_capacity: usize,
    pub compressor: CompressorSettings,
    pub reverb: ReverbSettings,
    pub master_gain: f32,
    /// Ramp time for master gain and reverb mix changes, in seconds
    pub ramp: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            lookahead: 0.1,
            poll_interval: Duration::from_millis(25),
            start_delay: 0.05,
            command_capacity: 1024,
            max_voices: 64,
            max_pending: 512,
            tap_capacity: 48_000 * 4,
            compressor: CompressorSettings::default(),
            reverb: ReverbSettings::default(),
            master_gain: 0.8,
            ramp: 0.005,
        }
    }
}

impl EngineConfig {
    pub fn sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn lookahead(mut self, seconds: f64) -> Self {
        self.lookahead = seconds.max(0.0);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn start_delay(mut self, seconds: f64) -> Self {
        self.start_delay = seconds.max(0.0);
        self
    }

    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(16);
        self
    }

    pub fn max_voices(mut self, voices: usize) -> Self {
        self.max_voices = voices.max(1);
        self
    }

    pub fn max_pending(mut self, pending: usize) -> Self {
        self.max_pending = pending.max(1);
        self
    }

    pub fn tap_capacity(mut self, samples: usize) -> Self {
        self.tap_capacity = samples.max(1);
        self
    }

    pub fn compressor(mut self, settings: CompressorSettings) -> Self {
        self.compressor = settings;
        self
    }

    pub fn reverb(mut self, settings: ReverbSettings) -> Self {
        self.reverb = settings;
        self
    }

    pub fn reverb_mix(mut self, mix: f32) -> Self {
        self.reverb.mix = mix.clamp(0.0, 1.0);
        self
    }

    pub fn master_gain(mut self, gain: f32) -> Self {
        self.master_gain = gain.max(0.0);
        self
    }

    pub fn ramp(mut self, seconds: f32) -> Self {
        self.ramp = seconds.max(0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_clamps_ranges() {
        let config = EngineConfig::default()
            .reverb_mix(3.0)
            .master_gain(-1.0)
            .max_voices(0);
        assert_eq!(config.reverb.mix, 1.0);
        assert_eq!(config.master_gain, 0.0);
        assert_eq!(config.max_voices, 1);
    }

    #[test]
    fn defaults_follow_the_engine_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.lookahead, 0.1);
        assert_eq!(config.poll_interval, Duration::from_millis(25));
        assert_eq!(config.compressor.threshold_db, -12.0);
        assert_eq!(config.compressor.ratio, 12.0);
    }
}
