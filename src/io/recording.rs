use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rtrb::Consumer;

/// Control-thread end of the bus's recording output.
///
/// Carries the mono mix right after master gain, before compression and
/// reverb. Samples only flow while the tap is armed; drain it regularly, the
/// ring holds a few seconds at most and drops samples when full.
pub struct RecordingTap {
    samples: Consumer<f32>,
    armed: Arc<AtomicBool>,
    sample_rate: f32,
}

impl RecordingTap {
    pub(crate) fn new(samples: Consumer<f32>, armed: Arc<AtomicBool>, sample_rate: f32) -> Self {
        Self {
            samples,
            armed,
            sample_rate,
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::Relaxed);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Relaxed);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Relaxed)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Move everything available into `out`; returns how many samples.
    pub fn drain_into(&mut self, out: &mut Vec<f32>) -> usize {
        let available = self.samples.slots();
        out.reserve(available);
        let mut count = 0;
        while let Ok(sample) = self.samples.pop() {
            out.push(sample);
            count += 1;
        }
        count
    }

    pub fn drain(&mut self) -> Vec<f32> {
        let mut out = Vec::new();
        self.drain_into(&mut out);
        out
    }
}

/// Where a finished take ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    /// Path, URL or any other handle the encoder understands
    pub location: String,
    pub byte_size: u64,
}

/// Turns tapped samples into something playable. The core never encodes.
pub trait RecordingEncoder {
    type Error: std::error::Error + Send + Sync + 'static;

    fn encode(&mut self, samples: &[f32], sample_rate: f32) -> Result<Recording, Self::Error>;
}
