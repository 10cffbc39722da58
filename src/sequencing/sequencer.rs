//! The step sequencer: one pattern, looped until stopped.
//!
//! ```text
//!   Idle ──start()──→ Playing ──stop()──→ Idle      (no pause)
//! ```
//!
//! Grid edits and tempo changes are allowed in either state. While playing
//! they reach the sound on the next scheduling pass; steps already handed to
//! the bus are not revisited.

use tracing::info;

use crate::engine::scheduler::{LookaheadScheduler, StepSource, TickReport};
use crate::error::ConfigurationError;
use crate::kit::{Kit, PadId};
use crate::synth::{synthesize, VoiceSink};

use super::pattern::SequencerPattern;

/// Fires every pad set on a step of `pattern`.
pub(crate) struct GridSource<'a, S: VoiceSink + ?Sized> {
    pub pattern: &'a SequencerPattern,
    pub kit: &'a Kit,
    pub sink: &'a mut S,
}

impl<S: VoiceSink + ?Sized> StepSource for GridSource<'_, S> {
    fn on_step(&mut self, step: usize, at: f64) {
        for pad in self.pattern.pads_at(step) {
            if let Some(pad) = self.kit.pad(pad) {
                synthesize(pad, at, 0.0, &mut *self.sink);
            }
        }
    }
}

pub struct StepSequencer {
    pattern: SequencerPattern,
    scheduler: LookaheadScheduler,
}

impl StepSequencer {
    pub fn new(pattern: SequencerPattern, lookahead: f64) -> Self {
        Self {
            pattern,
            scheduler: LookaheadScheduler::new(lookahead),
        }
    }

    pub fn pattern(&self) -> &SequencerPattern {
        &self.pattern
    }

    /// Replace the pattern. Playback, if running, carries on with it.
    pub fn load(&mut self, pattern: SequencerPattern) {
        let bpm = pattern.bpm();
        self.pattern = pattern;
        if self.scheduler.is_running() {
            self.scheduler.set_bpm(f64::from(bpm));
        }
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_running()
    }

    /// The next step to be scheduled.
    pub fn current_step(&self) -> usize {
        self.scheduler.current_step()
    }

    /// Start from step 0 with the first step at `at`.
    pub fn start(&mut self, at: f64) {
        info!(bpm = self.pattern.bpm(), at, "sequencer started");
        self.scheduler.start(f64::from(self.pattern.bpm()), at);
    }

    /// Stop scheduling and rewind. The caller cancels queued voices.
    pub fn stop(&mut self) {
        if self.scheduler.is_running() {
            info!("sequencer stopped");
        }
        self.scheduler.stop();
    }

    pub fn toggle_step(&mut self, pad: PadId, step: usize) -> Result<bool, ConfigurationError> {
        self.pattern.toggle_step(pad, step)
    }

    pub fn clear(&mut self) {
        self.pattern.clear();
    }

    pub fn set_bpm(&mut self, bpm: u32) -> Result<(), ConfigurationError> {
        self.pattern.set_bpm(bpm)?;
        self.scheduler.set_bpm(f64::from(bpm));
        Ok(())
    }

    pub fn tick<S: VoiceSink + ?Sized>(&mut self, now: f64, kit: &Kit, sink: &mut S) -> TickReport {
        let mut source = GridSource {
            pattern: &self.pattern,
            kit,
            sink,
        };
        self.scheduler.tick(now, &mut source)
    }
}
