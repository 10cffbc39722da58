pub mod config;
pub mod controller; // DrumMachine: the control-thread entry point
pub mod dsp;
pub mod engine; // Signal graph, render bus, clock and lookahead scheduler
pub mod error;
pub mod graph; // Composable audio graph nodes
pub mod input;
pub mod io; // Store, generator and recording seams
pub mod kit;
pub mod sequencing; // Patterns, sequencer, song arranger, loops
pub mod synth; // Voice synthesis

pub use config::{EngineConfig, ReverbSettings};
pub use controller::{DrumMachine, PlaybackMode, PlaybackState};
pub use error::{ArrangementError, ConfigurationError, DrumError, EngineError};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
