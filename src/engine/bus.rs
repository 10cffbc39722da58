//! The master bus: the render-path half of the signal graph.
//!
//! ```text
//!   pending ──(start frame reached)──→ active voices ──Σ──→ master gain ──┬──→ recording tap
//!                                                                        │
//!                                                     compressor ←───────┘
//!                                                         │
//!                                          ┌──────────────┴──────────────┐
//!                                         dry                   reverb (stereo convolution)
//!                                          └──────── wet/dry mix ────────┘
//!                                                         │
//!                                                   monitor output
//! ```
//!
//! The control thread never touches a `MasterBus` after handing it to a
//! backend. Everything it wants to change goes through a `BusCommand` on an
//! `rtrb` ring, and the bus drains that ring at the top of every block. A
//! cancel therefore removes every pending voice of its source whose start
//! frame has not been rendered yet; voices already sounding play out.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer, RingBuffer};

use crate::config::EngineConfig;
use crate::dsp::{
    automation::SmoothedParam,
    convolution::{ImpulseResponse, StereoConvolver},
    dynamics::Compressor,
    mix::{blend_dry_wet, crossfade_position},
};
use crate::io::RecordingTap;
use crate::kit::PadId;
use crate::synth::Voice;
use crate::MAX_BLOCK_SIZE;

use super::clock::AudioClock;

/// Length of the old → new reverb crossfade, in seconds.
pub const IMPULSE_CROSSFADE: f32 = 0.05;

/// Who scheduled a voice; cancellation is per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    Manual,
    Sequencer,
    Song,
    Loop(PadId),
}

/// Control → render messages.
pub enum BusCommand {
    Start {
        source: SourceId,
        frame: u64,
        voice: Voice,
    },
    Cancel {
        source: SourceId,
    },
    SetMasterGain(f32),
    SetReverbMix(f32),
    SwapImpulse(Box<StereoConvolver>),
}

/// Counters the render path publishes for the control thread.
#[derive(Debug, Default)]
pub struct BusStats {
    started: AtomicU64,
    cancelled: AtomicU64,
    dropped: AtomicU64,
    stolen: AtomicU64,
    active: AtomicUsize,
    pending: AtomicUsize,
}

impl BusStats {
    /// Voices that reached their start frame.
    pub fn started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    /// Pending voices removed by a cancel.
    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Voices lost to a full command queue or pending list.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Sounding voices cut to make room for newer ones.
    pub fn stolen(&self) -> u64 {
        self.stolen.load(Ordering::Relaxed)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }
}

/// Control-thread ends of the bus's queues.
pub struct BusHandle {
    pub commands: Producer<BusCommand>,
    pub retired: Consumer<Box<StereoConvolver>>,
    pub tap: RecordingTap,
    pub stats: Arc<BusStats>,
}

struct Pending {
    source: SourceId,
    frame: u64,
    voice: Voice,
}

struct Crossfade {
    convolver: Box<StereoConvolver>,
    elapsed: usize,
    length: usize,
}

pub struct MasterBus {
    sample_rate: f32,
    frame: u64,
    counter: Arc<AtomicU64>,

    commands: Consumer<BusCommand>,
    retired: Producer<Box<StereoConvolver>>,
    tap: Producer<f32>,
    tap_armed: Arc<AtomicBool>,
    stats: Arc<BusStats>,

    pending: Vec<Pending>,
    active: Vec<Voice>,
    max_pending: usize,
    max_voices: usize,

    master_gain: SmoothedParam,
    reverb_mix: SmoothedParam,
    compressor: Compressor,
    reverb: Box<StereoConvolver>,
    incoming: Option<Crossfade>,

    mix: Vec<f32>,
    scratch: Vec<f32>,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl MasterBus {
    /// Build the render half and the control half that talks to it.
    pub fn new(config: &EngineConfig, clock: &AudioClock) -> (Self, BusHandle) {
        let sample_rate = clock.sample_rate() as f32;
        let (command_tx, command_rx) = RingBuffer::new(config.command_capacity);
        let (retired_tx, retired_rx) = RingBuffer::new(4);
        let (tap_tx, tap_rx) = RingBuffer::new(config.tap_capacity);
        let tap_armed = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(BusStats::default());

        let reverb = config.reverb;
        let impulse =
            ImpulseResponse::generate(sample_rate, reverb.duration, reverb.decay, reverb.seed)
                .normalized();

        let bus = Self {
            sample_rate,
            frame: clock.frames(),
            counter: clock.counter(),
            commands: command_rx,
            retired: retired_tx,
            tap: tap_tx,
            tap_armed: Arc::clone(&tap_armed),
            stats: Arc::clone(&stats),
            pending: Vec::with_capacity(config.max_pending),
            active: Vec::with_capacity(config.max_voices),
            max_pending: config.max_pending,
            max_voices: config.max_voices,
            master_gain: SmoothedParam::new(config.master_gain, config.ramp, sample_rate),
            reverb_mix: SmoothedParam::new(reverb.mix, config.ramp, sample_rate),
            compressor: Compressor::new(config.compressor, sample_rate),
            reverb: Box::new(StereoConvolver::new(&impulse)),
            incoming: None,
            mix: vec![0.0; MAX_BLOCK_SIZE],
            scratch: vec![0.0; MAX_BLOCK_SIZE],
            left: vec![0.0; MAX_BLOCK_SIZE],
            right: vec![0.0; MAX_BLOCK_SIZE],
        };

        let handle = BusHandle {
            commands: command_tx,
            retired: retired_rx,
            tap: RecordingTap::new(tap_rx, tap_armed, sample_rate),
            stats,
        };

        (bus, handle)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Render interleaved output with `channels` channels.
    ///
    /// Mono devices get the average of both reverb sides; channels past the
    /// second get the same.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);

        for chunk in out.chunks_mut(MAX_BLOCK_SIZE * channels) {
            let frames = chunk.len() / channels;
            self.render_block(frames);

            for (i, frame) in chunk.chunks_mut(channels).enumerate().take(frames) {
                let (l, r) = (self.left[i], self.right[i]);
                match frame {
                    [mono] => *mono = (l + r) * 0.5,
                    [a, b, rest @ ..] => {
                        *a = l;
                        *b = r;
                        rest.fill((l + r) * 0.5);
                    }
                    [] => {}
                }
            }
        }
    }

    fn render_block(&mut self, len: usize) {
        self.drain_commands();

        let start = self.frame;
        let end = start + len as u64;

        self.render_voices(start, end, len);
        self.process_master(len);
        self.finish_crossfade();

        self.frame = end;
        self.counter.store(end, Ordering::Release);
        self.stats.active.store(self.active.len(), Ordering::Relaxed);
        self.stats.pending.store(self.pending.len(), Ordering::Relaxed);
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            match command {
                BusCommand::Start {
                    source,
                    frame,
                    voice,
                } => {
                    if self.pending.len() < self.max_pending {
                        self.pending.push(Pending {
                            source,
                            frame,
                            voice,
                        });
                    } else {
                        self.stats.record_dropped();
                    }
                }
                BusCommand::Cancel { source } => {
                    let before = self.pending.len();
                    self.pending.retain(|p| p.source != source);
                    let removed = (before - self.pending.len()) as u64;
                    self.stats.cancelled.fetch_add(removed, Ordering::Relaxed);
                }
                BusCommand::SetMasterGain(gain) => self.master_gain.set_target(gain.max(0.0)),
                BusCommand::SetReverbMix(mix) => self.reverb_mix.set_target(mix.clamp(0.0, 1.0)),
                BusCommand::SwapImpulse(convolver) => {
                    let length = (IMPULSE_CROSSFADE * self.sample_rate).round() as usize;
                    let next = Crossfade {
                        convolver,
                        elapsed: 0,
                        length,
                    };
                    // A swap arriving mid-fade replaces the half-faded newcomer
                    if let Some(abandoned) = self.incoming.replace(next) {
                        self.retire(abandoned.convolver);
                    }
                }
            }
        }
    }

    fn render_voices(&mut self, start: u64, end: u64, len: usize) {
        let sample_rate = self.sample_rate;
        let mix = &mut self.mix[..len];
        let scratch = &mut self.scratch[..];
        mix.fill(0.0);

        for voice in self.active.iter_mut() {
            voice.render_into(mix, scratch, sample_rate);
        }
        self.active.retain(|voice| !voice.is_finished());

        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].frame >= end {
                i += 1;
                continue;
            }

            let Pending {
                frame, mut voice, ..
            } = self.pending.swap_remove(i);
            // Late arrivals start at the top of the block
            let offset = frame.saturating_sub(start) as usize;

            voice.start(sample_rate);
            voice.render_into(&mut mix[offset..], scratch, sample_rate);
            self.stats.started.fetch_add(1, Ordering::Relaxed);

            if voice.is_finished() {
                continue;
            }
            if self.active.len() >= self.max_voices {
                self.active.remove(0);
                self.stats.stolen.fetch_add(1, Ordering::Relaxed);
            }
            self.active.push(voice);
        }
    }

    fn process_master(&mut self, len: usize) {
        let armed = self.tap_armed.load(Ordering::Relaxed);

        for i in 0..len {
            let sample = self.mix[i] * self.master_gain.next();
            if armed {
                // A full tap loses samples rather than blocking the render path
                let _ = self.tap.push(sample);
            }

            let dry = self.compressor.process(sample);
            let (mut wet_l, mut wet_r) = self.reverb.process(dry);

            if let Some(fade) = self.incoming.as_mut() {
                let (next_l, next_r) = fade.convolver.process(dry);
                let position = crossfade_position(fade.elapsed, fade.length);
                wet_l = blend_dry_wet(wet_l, next_l, position);
                wet_r = blend_dry_wet(wet_r, next_r, position);
                fade.elapsed += 1;
            }

            let mix = self.reverb_mix.next();
            self.left[i] = blend_dry_wet(dry, wet_l, mix);
            self.right[i] = blend_dry_wet(dry, wet_r, mix);
        }
    }

    fn finish_crossfade(&mut self) {
        let done = self
            .incoming
            .as_ref()
            .is_some_and(|fade| fade.elapsed >= fade.length);
        if !done {
            return;
        }
        if let Some(fade) = self.incoming.take() {
            let old = std::mem::replace(&mut self.reverb, fade.convolver);
            self.retire(old);
        }
    }

    fn retire(&mut self, convolver: Box<StereoConvolver>) {
        // If the control thread has fallen behind, the convolver is freed here
        let _ = self.retired.push(convolver);
    }
}
