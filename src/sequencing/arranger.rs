//! Song playback: saved patterns chained into sections with repeat counts.
//!
//! ```text
//!   Idle ──start()──→ Playing(section, repetition) ──last cycle──→ Idle
//! ```
//!
//! Each completed 16-step cycle counts one repetition. When a section has
//! played its repetitions the next section's pattern is resolved and, if its
//! tempo differs, the scheduler re-anchors on the boundary. After the last
//! section playback halts, unless the arrangement is marked `looping`.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::scheduler::{CycleFlow, LookaheadScheduler, StepSource, TickReport};
use crate::error::{ArrangementError, ConfigurationError, DrumError};
use crate::kit::Kit;
use crate::synth::{synthesize, VoiceSink};

use super::pattern::SequencerPattern;

/// Saved patterns by id.
pub type PatternLibrary = BTreeMap<String, SequencerPattern>;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongSection {
    pub id: String,
    pub name: String,
    pub pattern_id: String,
    pub repetitions: u32,
}

impl SongSection {
    pub fn new(id: &str, name: &str, pattern_id: &str, repetitions: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            pattern_id: pattern_id.to_string(),
            repetitions,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongArrangement {
    pub id: String,
    pub name: String,
    pub sections: Vec<SongSection>,
    /// Wrap to the first section instead of stopping
    #[cfg_attr(feature = "serde", serde(default))]
    pub looping: bool,
}

impl SongArrangement {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            sections: Vec::new(),
            looping: false,
        }
    }

    pub fn section(mut self, section: SongSection) -> Self {
        self.sections.push(section);
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self.sections.iter().find(|s| s.repetitions == 0) {
            Some(section) => Err(ConfigurationError::InvalidRepetitions {
                section: section.name.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn resolve(
    library: &PatternLibrary,
    section: &SongSection,
) -> Result<SequencerPattern, ArrangementError> {
    library
        .get(&section.pattern_id)
        .cloned()
        .ok_or_else(|| ArrangementError::PatternNotFound {
            section: section.name.clone(),
            pattern_id: section.pattern_id.clone(),
        })
}

struct Cursor {
    arrangement: SongArrangement,
    section: usize,
    repetition: u32,
    pattern: SequencerPattern,
    error: Option<ArrangementError>,
}

struct SongSource<'a, S: VoiceSink + ?Sized> {
    cursor: &'a mut Cursor,
    library: &'a PatternLibrary,
    kit: &'a Kit,
    sink: &'a mut S,
}

impl<S: VoiceSink + ?Sized> StepSource for SongSource<'_, S> {
    fn on_step(&mut self, step: usize, at: f64) {
        for pad in self.cursor.pattern.pads_at(step) {
            if let Some(pad) = self.kit.pad(pad) {
                synthesize(pad, at, 0.0, &mut *self.sink);
            }
        }
    }

    fn on_cycle_end(&mut self, _next_cycle: f64) -> CycleFlow {
        let cursor = &mut *self.cursor;
        let sections = &cursor.arrangement.sections;

        cursor.repetition += 1;
        if cursor.repetition < sections[cursor.section].repetitions {
            return CycleFlow::Continue;
        }
        cursor.repetition = 0;

        let next = if cursor.section + 1 < sections.len() {
            cursor.section + 1
        } else if cursor.arrangement.looping {
            0
        } else {
            info!(song = %cursor.arrangement.name, "song finished");
            return CycleFlow::Halt;
        };

        match resolve(self.library, &sections[next]) {
            Ok(pattern) => {
                info!(section = %sections[next].name, bpm = pattern.bpm(), "next section");
                let retempo = pattern.bpm() != cursor.pattern.bpm();
                cursor.section = next;
                cursor.pattern = pattern;
                if retempo {
                    CycleFlow::Retempo(f64::from(cursor.pattern.bpm()))
                } else {
                    CycleFlow::Continue
                }
            }
            Err(err) => {
                warn!(%err, "song halted");
                cursor.error = Some(err);
                CycleFlow::Halt
            }
        }
    }
}

pub struct SongArranger {
    cursor: Option<Cursor>,
    scheduler: LookaheadScheduler,
}

impl SongArranger {
    pub fn new(lookahead: f64) -> Self {
        Self {
            cursor: None,
            scheduler: LookaheadScheduler::new(lookahead),
        }
    }

    /// Start at the first section with its first step at `at`.
    ///
    /// Fails, and stays idle, if the arrangement is malformed or its first
    /// pattern is missing.
    pub fn start(
        &mut self,
        arrangement: SongArrangement,
        library: &PatternLibrary,
        at: f64,
    ) -> Result<(), DrumError> {
        arrangement.validate()?;
        let first = arrangement
            .sections
            .first()
            .ok_or(ArrangementError::EmptyArrangement)?;
        let pattern = resolve(library, first)?;

        info!(song = %arrangement.name, bpm = pattern.bpm(), at, "song started");
        self.scheduler.start(f64::from(pattern.bpm()), at);
        self.cursor = Some(Cursor {
            arrangement,
            section: 0,
            repetition: 0,
            pattern,
            error: None,
        });
        Ok(())
    }

    /// Stop and return to idle. The caller cancels queued voices.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.cursor = None;
    }

    pub fn is_playing(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn section_index(&self) -> Option<usize> {
        self.cursor.as_ref().map(|c| c.section)
    }

    pub fn repetition(&self) -> Option<u32> {
        self.cursor.as_ref().map(|c| c.repetition)
    }

    pub fn current_pattern(&self) -> Option<&SequencerPattern> {
        self.cursor.as_ref().map(|c| &c.pattern)
    }

    pub fn current_step(&self) -> usize {
        self.scheduler.current_step()
    }

    pub fn bpm(&self) -> Option<f64> {
        self.is_playing().then(|| self.scheduler.bpm())
    }

    /// Commit due steps. A missing pattern at a section boundary stops the
    /// song and is returned as the error.
    pub fn tick<S: VoiceSink + ?Sized>(
        &mut self,
        now: f64,
        kit: &Kit,
        library: &PatternLibrary,
        sink: &mut S,
    ) -> Result<TickReport, ArrangementError> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(TickReport::default());
        };

        let mut source = SongSource {
            cursor,
            library,
            kit,
            sink,
        };
        let report = self.scheduler.tick(now, &mut source);

        if report.halted {
            let error = self.cursor.take().and_then(|c| c.error);
            if let Some(err) = error {
                return Err(err);
            }
        }
        Ok(report)
    }
}
