//! Dynamics compression for the master bus.
//!
//! A compressor turns loud passages down so dense percussion sits together
//! instead of clipping. It works in decibels:
//!
//! ```text
//!   output dB
//!      │            ╱ ratio 1:1 (below threshold)
//!      │          ╱
//!      │        ╱__________ ratio 12:1 (above threshold)
//!      │      ╱
//!      │    ╱
//!      └──────────────────── input dB
//!             threshold
//! ```
//!
//! # Signal Flow
//!
//! 1. Detector: the input level in dB (`20 * log10(|x|)`)
//! 2. Gain computer: how far above threshold, divided down by the ratio,
//!    with a quadratic soft knee so the transition is not audible as a corner
//! 3. Ballistics: the gain reduction follows the computed target with a
//!    fast one-pole attack and a slower release, which keeps the gain from
//!    chattering on every waveform cycle
//! 4. Apply: multiply the input by the (linear) gain
//!
//! Attack and release are expressed as one-pole coefficients
//! `exp(-1 / (time * sample_rate))`.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorSettings {
    pub threshold_db: f32,
    pub ratio: f32,
    pub knee_db: f32,
    pub attack: f32,
    pub release: f32,
}

impl Default for CompressorSettings {
    /// Aggressive glue for dense percussion.
    fn default() -> Self {
        Self {
            threshold_db: -12.0,
            ratio: 12.0,
            knee_db: 6.0,
            attack: 0.002,
            release: 0.150,
        }
    }
}

#[inline]
fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.max(1e-6).log10()
}

#[inline]
fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

pub struct Compressor {
    settings: CompressorSettings,
    attack_coef: f32,
    release_coef: f32,
    /// Current gain reduction in dB (>= 0)
    reduction_db: f32,
}

impl Compressor {
    pub fn new(settings: CompressorSettings, sample_rate: f32) -> Self {
        let coef = |seconds: f32| (-1.0 / (seconds.max(1e-5) * sample_rate)).exp();
        Self {
            settings,
            attack_coef: coef(settings.attack),
            release_coef: coef(settings.release),
            reduction_db: 0.0,
        }
    }

    pub fn settings(&self) -> CompressorSettings {
        self.settings
    }

    /// Current gain reduction in dB.
    pub fn reduction_db(&self) -> f32 {
        self.reduction_db
    }

    /// Static curve: how many dB to remove from a signal at `level_db`.
    fn target_reduction(&self, level_db: f32) -> f32 {
        let CompressorSettings {
            threshold_db,
            ratio,
            knee_db,
            ..
        } = self.settings;
        let slope = 1.0 - 1.0 / ratio.max(1.0);
        let over = level_db - threshold_db;

        if knee_db > 0.0 && over.abs() <= knee_db / 2.0 {
            let x = over + knee_db / 2.0;
            slope * x * x / (2.0 * knee_db)
        } else if over > 0.0 {
            slope * over
        } else {
            0.0
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let target = self.target_reduction(gain_to_db(input.abs()));

        let coef = if target > self.reduction_db {
            self.attack_coef
        } else {
            self.release_coef
        };
        self.reduction_db = target + coef * (self.reduction_db - target);

        input * db_to_gain(-self.reduction_db)
    }

    pub fn reset(&mut self) {
        self.reduction_db = 0.0;
    }
}
