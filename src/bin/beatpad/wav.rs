//! WAV output through hound.

use std::path::PathBuf;

use beatpad::io::{Recording, RecordingEncoder};
use hound::{SampleFormat, WavSpec, WavWriter};

/// 32-bit float WAV at `sample_rate`.
pub fn float_spec(channels: u16, sample_rate: f32) -> WavSpec {
    WavSpec {
        channels,
        sample_rate: sample_rate.round() as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

/// Writes each take to `take-NNN.wav` in a directory.
pub struct WavEncoder {
    dir: PathBuf,
    takes: usize,
}

impl WavEncoder {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, takes: 0 }
    }
}

impl RecordingEncoder for WavEncoder {
    type Error = hound::Error;

    fn encode(&mut self, samples: &[f32], sample_rate: f32) -> Result<Recording, Self::Error> {
        self.takes += 1;
        let path = self.dir.join(format!("take-{:03}.wav", self.takes));

        let mut writer = WavWriter::create(&path, float_spec(1, sample_rate))?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;

        let byte_size = std::fs::metadata(&path)?.len();
        Ok(Recording {
            location: path.display().to_string(),
            byte_size,
        })
    }
}
