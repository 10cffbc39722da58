//! Signal graph, audio clock and lookahead scheduling.
//!
//! Two threads meet here. The control thread owns a `SignalGraph` and the
//! schedulers; the render path owns the `MasterBus`. They share only an
//! `rtrb` command ring (control → render), a ring for retired reverb
//! convolvers (render → control), the recording tap, and a few atomics.

pub mod backend;
pub mod bus;
pub mod clock;
pub mod graph;
pub mod scheduler;

pub use backend::{AudioBackend, CpalBackend, OfflineBackend};
pub use bus::{BusStats, MasterBus, SourceId};
pub use clock::AudioClock;
pub use graph::{BusPort, RoutedSink, SignalGraph};
pub use scheduler::{
    step_duration, CycleFlow, LookaheadScheduler, SchedulingOverrun, StepSource, TickReport,
    STEPS_PER_CYCLE,
};
