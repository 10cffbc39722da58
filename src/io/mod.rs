//! Seams to the collaborators the core does not implement: persistence,
//! pattern generation and recording encoding.

pub mod generator;
pub mod recording;
pub mod store;

pub use generator::{GeneratedPattern, PatternGenerator, RandomGenerator};
pub use recording::{Recording, RecordingEncoder, RecordingTap};
pub use store::{MemoryStore, Record, Store};
