//! Benchmarks for low-level DSP primitives.

mod convolution;
mod distortion;
mod dynamics;
mod envelope;
mod filter;
mod mix;
mod oscillator;

pub use convolution::bench_convolution;
pub use distortion::bench_distortion;
pub use dynamics::bench_dynamics;
pub use envelope::bench_envelope;
pub use filter::bench_filter;
pub use mix::bench_mix;
pub use oscillator::bench_oscillator;
