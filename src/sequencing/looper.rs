//! Loop mode: pads that retrigger themselves until toggled off.
//!
//! Every looping pad gets its own lookahead scheduler anchored at the moment
//! it was switched on, so loops neither wait for nor disturb each other or
//! the sequencer. A single-hit pad repeats every 4 steps (a beat); a
//! composite loop pad retriggers every bar, so its longer passes overlap.

use std::collections::BTreeMap;

use tracing::info;

use crate::engine::bus::SourceId;
use crate::engine::graph::RoutedSink;
use crate::engine::scheduler::{LookaheadScheduler, StepSource, TickReport};
use crate::kit::{Kit, PadConfig, PadId, Voicing};
use crate::synth::synthesize;

/// Steps between repeats of a single-hit pad.
pub const SINGLE_HIT_INTERVAL: u64 = 4;

/// Steps between retriggers of a composite loop pad.
pub const COMPOSITE_INTERVAL: u64 = 16;

/// Steps between repeats of `pad`.
pub fn repeat_interval(pad: &PadConfig) -> u64 {
    match pad.voicing() {
        Voicing::Loop(_) => COMPOSITE_INTERVAL,
        _ => SINGLE_HIT_INTERVAL,
    }
}

#[derive(Debug, Clone)]
pub struct LoopHandle {
    pad: PadId,
    every: u64,
    elapsed: u64,
    scheduler: LookaheadScheduler,
}

impl LoopHandle {
    pub fn pad(&self) -> PadId {
        self.pad
    }

    /// Steps between repeats.
    pub fn interval(&self) -> u64 {
        self.every
    }
}

struct Repeat<'a, S: RoutedSink + ?Sized> {
    pad: &'a PadConfig,
    every: u64,
    elapsed: &'a mut u64,
    sink: &'a mut S,
}

impl<S: RoutedSink + ?Sized> StepSource for Repeat<'_, S> {
    fn on_step(&mut self, _step: usize, at: f64) {
        if *self.elapsed % self.every == 0 {
            synthesize(self.pad, at, 0.0, &mut *self.sink);
        }
        *self.elapsed += 1;
    }
}

/// The set of pads currently looping, keyed by pad id.
#[derive(Debug, Clone)]
pub struct LoopSet {
    lookahead: f64,
    handles: BTreeMap<PadId, LoopHandle>,
}

impl LoopSet {
    pub fn new(lookahead: f64) -> Self {
        Self {
            lookahead,
            handles: BTreeMap::new(),
        }
    }

    /// Start looping `pad` from `at`, or stop it if it already loops.
    ///
    /// Returns whether the pad is looping afterwards.
    pub fn toggle(&mut self, pad: &PadConfig, bpm: f64, at: f64) -> bool {
        if self.stop(pad.id()) {
            return false;
        }

        let mut scheduler = LookaheadScheduler::new(self.lookahead);
        scheduler.start(bpm, at);
        let handle = LoopHandle {
            pad: pad.id(),
            every: repeat_interval(pad),
            elapsed: 0,
            scheduler,
        };
        info!(pad = pad.id(), every = handle.every, "loop on");
        self.handles.insert(pad.id(), handle);
        true
    }

    /// Stop one loop. Returns whether it was looping.
    pub fn stop(&mut self, pad: PadId) -> bool {
        let removed = self.handles.remove(&pad).is_some();
        if removed {
            info!(pad, "loop off");
        }
        removed
    }

    /// Stop every loop and return the pads that were looping.
    pub fn stop_all(&mut self) -> Vec<PadId> {
        let pads = self.handles.keys().copied().collect();
        self.handles.clear();
        pads
    }

    /// Drop loops for pads `kit` no longer has.
    pub fn retain_known(&mut self, kit: &Kit) -> Vec<PadId> {
        let gone: Vec<PadId> = self
            .handles
            .keys()
            .copied()
            .filter(|&pad| !kit.contains(pad))
            .collect();
        for pad in &gone {
            self.handles.remove(pad);
        }
        gone
    }

    pub fn is_looping(&self, pad: PadId) -> bool {
        self.handles.contains_key(&pad)
    }

    pub fn pads(&self) -> impl Iterator<Item = PadId> + '_ {
        self.handles.keys().copied()
    }

    pub fn handles(&self) -> impl Iterator<Item = &LoopHandle> {
        self.handles.values()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Follow a tempo change from each loop's next step on.
    pub fn set_bpm(&mut self, bpm: f64) {
        for handle in self.handles.values_mut() {
            handle.scheduler.set_bpm(bpm);
        }
    }

    /// Commit due repeats of every loop, each under its own `SourceId`.
    pub fn tick<S: RoutedSink + ?Sized>(&mut self, now: f64, kit: &Kit, sink: &mut S) -> TickReport {
        let mut report = TickReport::default();
        for handle in self.handles.values_mut() {
            let Some(pad) = kit.pad(handle.pad) else {
                continue;
            };
            sink.route(SourceId::Loop(handle.pad));
            let mut source = Repeat {
                pad,
                every: handle.every,
                elapsed: &mut handle.elapsed,
                sink: &mut *sink,
            };
            report.merge(handle.scheduler.tick(now, &mut source));
        }
        report
    }
}
