//! Control-thread half of the signal graph.
//!
//! `SignalGraph` builds the master bus on first use, hands it to the
//! backend, and from then on only talks to it through the command ring.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{EngineConfig, ReverbSettings};
use crate::dsp::convolution::{ImpulseResponse, StereoConvolver};
use crate::error::EngineError;
use crate::io::RecordingTap;
use crate::synth::{Voice, VoiceSink};

use super::backend::AudioBackend;
use super::bus::{BusCommand, BusHandle, BusStats, MasterBus, SourceId};
use super::clock::AudioClock;

/// A `VoiceSink` whose voices can be attributed to different sources.
pub trait RoutedSink: VoiceSink {
    /// Attribute voices scheduled from now on to `source`.
    fn route(&mut self, source: SourceId);
}

struct Live {
    clock: AudioClock,
    handle: BusHandle,
}

pub struct SignalGraph<B: AudioBackend> {
    backend: B,
    config: EngineConfig,
    live: Option<Live>,
}

impl<B: AudioBackend> SignalGraph<B> {
    pub fn new(backend: B, config: EngineConfig) -> Self {
        Self {
            backend,
            config,
            live: None,
        }
    }

    /// Build the bus and acquire the output, once. Later calls do nothing.
    pub fn ensure_built(&mut self) -> Result<(), EngineError> {
        if self.live.is_some() {
            return Ok(());
        }

        let clock = AudioClock::new(self.backend.sample_rate());
        let (bus, handle) = MasterBus::new(&self.config, &clock);
        self.backend.open(bus)?;

        info!(sample_rate = clock.sample_rate(), "signal graph built");
        self.live = Some(Live { clock, handle });
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.live.is_some()
    }

    /// Resume a suspended output. `false` means the caller should drop
    /// whatever it was about to schedule.
    pub fn ensure_running(&mut self) -> bool {
        if !self.backend.is_suspended() {
            return true;
        }
        match self.backend.resume() {
            Ok(()) => {
                debug!("output resumed");
                true
            }
            Err(err) => {
                debug!(%err, "output still suspended, dropping event");
                false
            }
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn clock(&self) -> Option<&AudioClock> {
        self.live.as_ref().map(|live| &live.clock)
    }

    /// Audio-clock time, or 0 before the graph exists.
    pub fn now(&self) -> f64 {
        self.clock().map_or(0.0, AudioClock::now)
    }

    pub fn stats(&self) -> Option<&BusStats> {
        self.live.as_ref().map(|live| &*live.handle.stats)
    }

    pub fn shared_stats(&self) -> Option<Arc<BusStats>> {
        self.live.as_ref().map(|live| Arc::clone(&live.handle.stats))
    }

    pub fn tap(&self) -> Option<&RecordingTap> {
        self.live.as_ref().map(|live| &live.handle.tap)
    }

    pub fn tap_mut(&mut self) -> Option<&mut RecordingTap> {
        self.live.as_mut().map(|live| &mut live.handle.tap)
    }

    /// A sink that schedules voices for `source` at `tempo`.
    pub fn port(&mut self, source: SourceId, tempo: f64) -> Option<BusPort<'_>> {
        self.live.as_mut().map(|live| BusPort {
            live,
            source,
            tempo,
        })
    }

    /// Remove every not-yet-started voice of `source`.
    pub fn cancel(&mut self, source: SourceId) {
        self.send(BusCommand::Cancel { source });
    }

    pub fn set_master_gain(&mut self, gain: f32) {
        self.config.master_gain = gain.max(0.0);
        self.send(BusCommand::SetMasterGain(self.config.master_gain));
    }

    pub fn set_reverb_mix(&mut self, mix: f32) {
        self.config.reverb.mix = mix.clamp(0.0, 1.0);
        self.send(BusCommand::SetReverbMix(self.config.reverb.mix));
    }

    /// Regenerate the reverb impulse with a new tail shape.
    ///
    /// The new convolver is built here; the render path crossfades to it.
    pub fn set_reverb(&mut self, reverb: ReverbSettings) {
        self.config.reverb = ReverbSettings {
            mix: self.config.reverb.mix,
            ..reverb
        };
        let Some(clock) = self.clock() else {
            return;
        };

        let sample_rate = clock.sample_rate() as f32;
        let impulse =
            ImpulseResponse::generate(sample_rate, reverb.duration, reverb.decay, reverb.seed)
                .normalized();
        debug!(
            duration = reverb.duration,
            decay = reverb.decay,
            "swapping reverb impulse"
        );
        self.send(BusCommand::SwapImpulse(Box::new(StereoConvolver::new(
            &impulse,
        ))));
    }

    /// Free convolvers the render path has finished with.
    pub fn collect_retired(&mut self) -> usize {
        let Some(live) = self.live.as_mut() else {
            return 0;
        };
        let mut count = 0;
        while live.handle.retired.pop().is_ok() {
            count += 1;
        }
        count
    }

    fn send(&mut self, command: BusCommand) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if live.handle.commands.push(command).is_err() {
            warn!("bus command queue full, command dropped");
        }
    }
}

/// Schedules voices onto the bus for one source.
pub struct BusPort<'a> {
    live: &'a mut Live,
    source: SourceId,
    tempo: f64,
}

impl BusPort<'_> {
    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn now(&self) -> f64 {
        self.live.clock.now()
    }
}

impl VoiceSink for BusPort<'_> {
    fn tempo(&self) -> f64 {
        self.tempo
    }

    fn schedule(&mut self, at: f64, voice: Voice) {
        let frame = self.live.clock.frame_at(at);
        let command = BusCommand::Start {
            source: self.source,
            frame,
            voice,
        };
        if self.live.handle.commands.push(command).is_err() {
            self.live.handle.stats.record_dropped();
            warn!(source = ?self.source, at, "bus command queue full, voice dropped");
        }
    }
}

impl RoutedSink for BusPort<'_> {
    fn route(&mut self, source: SourceId) {
        self.source = source;
    }
}
