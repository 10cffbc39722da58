//! Whole-path benchmarks: kit voices, the master bus, sequencer ticks.

mod bus;
mod voices;

pub use bus::{bench_bus, bench_sequencer};
pub use voices::bench_voices;
