//! Patterns, the step sequencer, song arrangement and loop mode.
//!
//! All three players drive their own `LookaheadScheduler` from the same
//! control-thread tick and send voices to the same bus, each under its own
//! `SourceId` so it can be stopped without touching the others.

pub mod arranger;
pub mod looper;
pub mod pattern;
pub mod sequencer;

pub use arranger::{PatternLibrary, SongArrangement, SongArranger, SongSection};
pub use looper::{LoopHandle, LoopSet};
pub use pattern::{
    row, Grid, LooseGrid, PatternRecord, SequencerPattern, ShapePolicy, MAX_BPM, MIN_BPM, STEPS,
};
pub use sequencer::StepSequencer;
