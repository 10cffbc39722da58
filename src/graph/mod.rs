//! Composable building blocks for drum voices.
//!
//! Graph nodes wrap the low-level DSP primitives with what a voice needs: a
//! start event, activity tracking and block-based rendering. The
//! `extensions` module adds the fluent combinators every voice generator is
//! written with.

/// Multiply two signals together (envelope × oscillator), plus fixed gain.
pub mod amplify;
/// Saturation and soft clipping.
pub mod distortion;
/// Percussive envelope node.
pub mod envelope;
/// Fluent combinators (`.amplify()`, `.through()`, `.mix()`, `.gain()`).
pub mod extensions;
/// State-variable filter node with optional cutoff sweep.
pub mod filter;
/// Linear mixing for layered voices.
pub mod mix;
/// Core traits shared by all graph nodes.
pub mod node;
/// Audio-band oscillators and noise sources with pitch sweeps.
pub mod oscillator;
/// Serial chaining of two nodes (source → effect).
pub mod through;

pub use extensions::NodeExt;
pub use node::{GraphNode, RenderCtx};
