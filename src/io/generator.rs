use std::convert::Infallible;

use crate::error::ConfigurationError;
use crate::kit::{Kit, SoundType};
use crate::sequencing::pattern::{check_bpm, shape_grid, Grid, LooseGrid, ShapePolicy, STEPS};

/// A grid and tempo from a pattern generator, not yet checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPattern {
    pub grid: LooseGrid,
    pub bpm: u32,
}

impl GeneratedPattern {
    /// Check every row is 16 steps for a pad `kit` has, and the tempo is in
    /// range. Nothing is coerced.
    pub fn validate(&self, kit: &Kit) -> Result<(Grid, u32), ConfigurationError> {
        let bpm = check_bpm(self.bpm)?;
        let grid = shape_grid(&self.grid, ShapePolicy::Strict, Some(kit))?;
        Ok((grid, bpm))
    }
}

/// Produces a pattern from a text prompt. What it does with the prompt is
/// its own affair; the result is validated before it is loaded.
pub trait PatternGenerator {
    type Error: std::error::Error + Send + Sync + 'static;

    fn generate_pattern(&mut self, prompt: &str, kit: &Kit)
        -> Result<GeneratedPattern, Self::Error>;
}

/// Offline stand-in: fills the grid with weighted coin flips.
///
/// Kicks favour the downbeats, snares the backbeat, hats the off-steps. A
/// prompt mentioning "fast" or "slow" (or a genre that implies one) moves the
/// tempo.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    rng: fastrand::Rng,
}

impl RandomGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    fn tempo(&mut self, prompt: &str) -> u32 {
        let prompt = prompt.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| prompt.contains(w));
        let base = if has(&["fast", "trap", "drill", "dnb"]) {
            140
        } else if has(&["slow", "lofi", "lo-fi", "chill"]) {
            85
        } else {
            110
        };
        base + self.rng.u32(0..10)
    }

    fn chance(sound: SoundType, step: usize) -> f32 {
        let downbeat = step % 4 == 0;
        match sound {
            SoundType::Kick if step % 8 == 0 => 0.95,
            SoundType::Kick if downbeat => 0.4,
            SoundType::Kick => 0.1,
            SoundType::Snare if step % 8 == 4 => 0.9,
            SoundType::Snare => 0.05,
            SoundType::HiHat if step % 2 == 0 => 0.8,
            SoundType::HiHat => 0.3,
            SoundType::Bass if downbeat => 0.3,
            SoundType::Bass | SoundType::Synth => 0.08,
            SoundType::Fx => 0.02,
        }
    }
}

impl PatternGenerator for RandomGenerator {
    type Error = Infallible;

    fn generate_pattern(
        &mut self,
        prompt: &str,
        kit: &Kit,
    ) -> Result<GeneratedPattern, Self::Error> {
        let bpm = self.tempo(prompt);
        let grid = kit
            .pads()
            .iter()
            .filter(|pad| !pad.is_loop())
            .map(|pad| {
                let row = (0..STEPS)
                    .map(|step| self.rng.f32() < Self::chance(pad.sound_type(), step))
                    .collect();
                (pad.id(), row)
            })
            .collect();
        Ok(GeneratedPattern { grid, bpm })
    }
}
