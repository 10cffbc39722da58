use crate::{graph::node::RenderCtx, MIN_TIME};

/*
Percussive Envelope
===================

Drum voices are never "held": a hit rises almost instantly and dies away on
its own. So instead of the classic ADSR state machine this envelope has only
two active stages, and the decay is exponential rather than linear.

Vocabulary
----------

  level     The envelope's current output value (0.0 to `peak`). This
            multiplies the audio signal to control its amplitude over time.

  floor     The level (-60 dB) at which the decay is considered finished.
            Reaching it snaps the level to 0.0 and the envelope goes idle.

  burst     A re-attack partway through the envelope. Hand claps are several
            hands hitting a few milliseconds apart, so the clap envelope is a
            train of short bursts followed by the real decay.


The Shape
---------

  Level
   peak ┐ ╱╲
        │╱  ╲
        │    ╲__
        │       ╲___
  floor └───────────╲___──→ Time
        A    Decay (exponential)

  With bursts (clap, 4 bursts):

   peak ┐╱╲╱╲╱╲╱╲
        │         ╲__
        │            ╲____
  floor └─────────────────╲──→ Time
         ↑  ↑  ↑  ↑
         burst starts, `spacing` apart


The Math: Exponential Decay
---------------------------

Each sample in the decay stage does `level *= coef`, where

    coef = (floor / peak) ^ (1 / (decay_time * sample_rate))

so after exactly `decay_time` seconds the level has fallen from `peak` to
`floor`. An exponential fall sounds like a struck object ringing out; a
linear one sounds like a fade.

Coefficients depend on the sample rate, so they are computed in `note_on`
from the render context rather than at construction.


The State Machine
-----------------

    ┌──────┐ note_on ┌────────┐ level=peak ┌───────┐ level<=floor ┌──────┐
    │ Idle │ ──────→ │ Attack │ ─────────→ │ Decay │ ───────────→ │ Idle │
    └──────┘         └────────┘            └───────┘              └──────┘
                          ↑     next burst      │
                          └─────────────────────┘

A burst restarts the attack from the CURRENT level, never from zero, so the
re-attack never clicks.
*/

/// Level at which a decay counts as silent (-60 dB).
pub const DECAY_FLOOR: f32 = 0.001;
const MAX_BURSTS: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    Attack,
    Decay,
}

pub struct Envelope {
    // Shape parameters (set once)
    attack_time: f32,
    decay_time: f32,
    peak: f32,
    bursts: u8,
    burst_spacing: f32,

    // Rates, derived from the sample rate at note_on
    attack_increment: f32,
    burst_coef: f32,
    decay_coef: f32,
    spacing_samples: u32,

    // Runtime state
    stage: EnvelopeState,
    level: f32,
    elapsed: u32,
    burst_index: u8,
}

impl Envelope {
    /// A single hit: linear attack then exponential decay to silence.
    pub fn percussive(attack: f32, decay: f32) -> Self {
        Self {
            attack_time: attack.max(MIN_TIME),
            decay_time: decay.max(MIN_TIME),
            peak: 1.0,
            bursts: 1,
            burst_spacing: 0.0,

            attack_increment: 0.0,
            burst_coef: 1.0,
            decay_coef: 1.0,
            spacing_samples: 0,

            stage: EnvelopeState::Idle,
            level: 0.0,
            elapsed: 0,
            burst_index: 0,
        }
    }

    /// A train of `count` bursts `spacing` seconds apart; the last one decays
    /// over `decay`.
    pub fn bursts(count: u8, spacing: f32, decay: f32) -> Self {
        let mut env = Self::percussive(0.001, decay);
        env.bursts = count.clamp(1, MAX_BURSTS);
        env.burst_spacing = spacing.max(MIN_TIME);
        env
    }

    pub fn with_peak(mut self, peak: f32) -> Self {
        self.peak = peak.clamp(DECAY_FLOOR * 2.0, 1.0);
        self
    }

    /// Time from note_on until the envelope reaches the floor.
    pub fn duration(&self) -> f32 {
        let lead_in = if self.bursts > 1 {
            self.burst_spacing * (self.bursts - 1) as f32
        } else {
            0.0
        };
        lead_in + self.attack_time + self.decay_time
    }

    fn decay_coefficient(&self, seconds: f32, sample_rate: f32) -> f32 {
        let samples = (seconds * sample_rate).max(1.0);
        (DECAY_FLOOR / self.peak).powf(1.0 / samples)
    }

    /// Start the envelope (retriggers from zero).
    pub fn note_on(&mut self, ctx: &RenderCtx) {
        let sr = ctx.sample_rate;
        self.attack_increment = self.peak / (self.attack_time * sr).max(1.0);
        self.decay_coef = self.decay_coefficient(self.decay_time, sr);
        // Intermediate bursts die within their own slot
        self.burst_coef = self.decay_coefficient(self.burst_spacing * 0.8, sr);
        self.spacing_samples = (self.burst_spacing * sr).round() as u32;

        self.level = 0.0;
        self.elapsed = 0;
        self.burst_index = 0;
        self.stage = EnvelopeState::Attack;
    }

    /// Advance the envelope by one sample.
    pub fn next_sample(&mut self) {
        if self.stage == EnvelopeState::Idle {
            self.level = 0.0;
            return;
        }

        self.elapsed = self.elapsed.saturating_add(1);

        let next_burst = self.burst_index + 1;
        if next_burst < self.bursts && self.elapsed >= self.spacing_samples * next_burst as u32 {
            self.burst_index = next_burst;
            self.stage = EnvelopeState::Attack;
        }

        match self.stage {
            EnvelopeState::Idle => {}

            EnvelopeState::Attack => {
                self.level += self.attack_increment;
                if self.level >= self.peak {
                    self.level = self.peak;
                    self.stage = EnvelopeState::Decay;
                }
            }

            EnvelopeState::Decay => {
                let last_burst = self.burst_index + 1 >= self.bursts;
                self.level *= if last_burst {
                    self.decay_coef
                } else {
                    self.burst_coef
                };

                if last_burst && self.level <= DECAY_FLOOR {
                    self.level = 0.0;
                    self.stage = EnvelopeState::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            self.next_sample();
            *sample = self.level;
        }
    }

    /// Returns true if the envelope is producing output (not idle).
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeState::Idle
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeState::Idle;
        self.level = 0.0;
        self.elapsed = 0;
        self.burst_index = 0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }
}
