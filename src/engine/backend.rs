//! Audio outputs a `MasterBus` can be handed to.
//!
//! A backend owns the platform resource. `SignalGraph` opens it exactly once
//! and afterwards only asks whether it is suspended.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error};

use crate::error::EngineError;

use super::bus::MasterBus;

pub trait AudioBackend {
    /// Rate the bus must render at.
    fn sample_rate(&self) -> f32;

    /// Acquire the output and start pulling audio from `bus`.
    fn open(&mut self, bus: MasterBus) -> Result<(), EngineError>;

    fn is_suspended(&self) -> bool;

    fn resume(&mut self) -> Result<(), EngineError>;
}

/// Live output on the default cpal device.
pub struct CpalBackend {
    device: cpal::Device,
    config: cpal::StreamConfig,
    stream: Option<cpal::Stream>,
    suspended: bool,
}

impl CpalBackend {
    /// Look up the default output device and its preferred format.
    pub fn new() -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            EngineError::ResourceUnavailable("no default output device available".into())
        })?;
        let config = device
            .default_output_config()
            .map_err(|err| EngineError::ResourceUnavailable(err.to_string()))?;

        Ok(Self {
            device,
            config: config.into(),
            stream: None,
            suspended: false,
        })
    }

    pub fn channels(&self) -> usize {
        usize::from(self.config.channels)
    }

    /// Stop pulling audio without releasing the device.
    pub fn suspend(&mut self) -> Result<(), EngineError> {
        if let Some(stream) = &self.stream {
            stream
                .pause()
                .map_err(|err| EngineError::ResourceUnavailable(err.to_string()))?;
            self.suspended = true;
        }
        Ok(())
    }
}

impl AudioBackend for CpalBackend {
    fn sample_rate(&self) -> f32 {
        self.config.sample_rate.0 as f32
    }

    fn open(&mut self, mut bus: MasterBus) -> Result<(), EngineError> {
        let channels = self.channels();
        debug!(
            sample_rate = self.config.sample_rate.0,
            channels, "opening output stream"
        );

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _| bus.render(data, channels),
                |err| error!(%err, "output stream error"),
                None,
            )
            .map_err(|err| EngineError::ResourceUnavailable(err.to_string()))?;
        stream
            .play()
            .map_err(|err| EngineError::ResourceUnavailable(err.to_string()))?;

        self.stream = Some(stream);
        self.suspended = false;
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| EngineError::ResourceUnavailable("stream is not open".into()))?;
        stream
            .play()
            .map_err(|err| EngineError::ResourceUnavailable(err.to_string()))?;
        self.suspended = false;
        Ok(())
    }
}

/// Renders on demand instead of on a device callback.
///
/// Used for bouncing to a file and for driving the engine deterministically
/// in tests: the caller alternates control ticks with `render` calls.
pub struct OfflineBackend {
    sample_rate: f32,
    channels: usize,
    bus: Option<MasterBus>,
    opens: usize,
    suspended: bool,
    refuse_resume: bool,
}

impl OfflineBackend {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            channels: 2,
            bus: None,
            opens: 0,
            suspended: false,
            refuse_resume: false,
        }
    }

    /// Open in the suspended state, like an output waiting for a user gesture.
    pub fn suspended(mut self) -> Self {
        self.suspended = true;
        self
    }

    /// Make every `resume` fail.
    pub fn refusing_resume(mut self) -> Self {
        self.refuse_resume = true;
        self
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// How many times the output was acquired.
    pub fn opens(&self) -> usize {
        self.opens
    }

    /// Render `frames` interleaved stereo frames.
    ///
    /// A suspended or unopened backend produces silence and does not advance
    /// the audio clock.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * self.channels];
        self.render_into(&mut out);
        out
    }

    pub fn render_into(&mut self, out: &mut [f32]) {
        match self.bus.as_mut() {
            Some(bus) if !self.suspended => bus.render(out, self.channels),
            _ => out.fill(0.0),
        }
    }

    /// Render `seconds` worth of audio in blocks of `block` frames.
    pub fn render_seconds(&mut self, seconds: f64, block: usize) -> Vec<f32> {
        let total = (seconds * f64::from(self.sample_rate)).round() as usize;
        let mut out = vec![0.0; total * self.channels];
        for chunk in out.chunks_mut(block.max(1) * self.channels) {
            self.render_into(chunk);
        }
        out
    }
}

impl AudioBackend for OfflineBackend {
    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn open(&mut self, bus: MasterBus) -> Result<(), EngineError> {
        self.opens += 1;
        self.bus = Some(bus);
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        if self.refuse_resume {
            return Err(EngineError::ResourceUnavailable("resume refused".into()));
        }
        self.suspended = false;
        Ok(())
    }
}
