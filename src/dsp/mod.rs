//! Low-level DSP primitives used by the graph nodes and the master bus.
//!
//! These components are realtime-safe once constructed: nothing in a
//! per-sample or per-block path allocates, so they can be embedded directly
//! inside voices and the bus.

/// Linear and exponential parameter ramps.
pub mod automation;
/// Partitioned FFT convolution and generated impulse responses.
pub mod convolution;
/// Asymmetric saturation and soft clipping.
pub mod distortion;
/// Master-bus compressor.
pub mod dynamics;
/// Percussive (attack / exponential decay) envelope with bursts.
pub mod envelope;
/// State-variable filter implementation with multiple responses.
pub mod filter;
/// Summing, dry/wet and crossfade helpers.
pub mod mix;
/// Oscillator waveforms and noise sources.
pub mod oscillator;

pub use automation::{Automation, SmoothedParam};
pub use envelope::EnvelopeState;
