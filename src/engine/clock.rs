use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Read side of the render path's frame counter.
///
/// The bus advances the counter after every rendered block, so `now()` is
/// the time of the first frame the bus has not rendered yet. Anything
/// scheduled at or after `now()` will still be heard on time.
#[derive(Debug, Clone)]
pub struct AudioClock {
    frames: Arc<AtomicU64>,
    sample_rate: f64,
}

impl AudioClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frames: Arc::new(AtomicU64::new(0)),
            sample_rate: f64::from(sample_rate),
        }
    }

    pub(crate) fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.frames)
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Seconds since the graph was built.
    pub fn now(&self) -> f64 {
        self.frames() as f64 / self.sample_rate
    }

    /// The frame a time lands on; negative times clamp to frame 0.
    pub fn frame_at(&self, seconds: f64) -> u64 {
        (seconds * self.sample_rate).round().max(0.0) as u64
    }
}
