//! The control-thread entry point.
//!
//! `DrumMachine` owns the kit, the signal graph and one `PlaybackState`, and
//! is driven by two kinds of calls: user actions (`trigger_pad`,
//! `start_sequencer`, `toggle_step`, ...) and `tick`, which the host polls
//! every `EngineConfig::poll_interval` to feed the lookahead schedulers.
//!
//! ```ignore
//! let mut machine = DrumMachine::new(CpalBackend::new()?, EngineConfig::default());
//! machine.trigger_pad(0, 0.0)?;
//! machine.start_sequencer()?;
//! loop {
//!     machine.tick()?;
//!     std::thread::sleep(machine.config().poll_interval);
//! }
//! ```

use tracing::{debug, info};

use crate::config::{EngineConfig, ReverbSettings};
use crate::engine::{AudioBackend, BusStats, SignalGraph, SourceId, TickReport};
use crate::error::{ConfigurationError, DrumError};
use crate::io::{GeneratedPattern, PatternGenerator, Recording, RecordingEncoder, Store};
use crate::kit::{factory_kit, Kit, PadConfig, PadId};
use crate::sequencing::{
    LoopSet, PatternLibrary, SequencerPattern, SongArrangement, SongArranger, StepSequencer,
};
use crate::synth::synthesize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    Idle,
    SequencerPlaying,
    SongPlaying,
}

/// Everything that moves: the sequencer, the song arranger and the loops.
///
/// At most one of sequencer and song plays at a time; loops run alongside
/// either.
pub struct PlaybackState {
    sequencer: StepSequencer,
    arranger: SongArranger,
    loops: LoopSet,
    loop_mode: bool,
}

impl PlaybackState {
    fn new(pattern: SequencerPattern, lookahead: f64) -> Self {
        Self {
            sequencer: StepSequencer::new(pattern, lookahead),
            arranger: SongArranger::new(lookahead),
            loops: LoopSet::new(lookahead),
            loop_mode: false,
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        if self.arranger.is_playing() {
            PlaybackMode::SongPlaying
        } else if self.sequencer.is_playing() {
            PlaybackMode::SequencerPlaying
        } else {
            PlaybackMode::Idle
        }
    }

    /// Step about to be scheduled by whichever transport is running.
    pub fn current_step(&self) -> usize {
        match self.mode() {
            PlaybackMode::SongPlaying => self.arranger.current_step(),
            _ => self.sequencer.current_step(),
        }
    }

    pub fn sequencer(&self) -> &StepSequencer {
        &self.sequencer
    }

    pub fn arranger(&self) -> &SongArranger {
        &self.arranger
    }

    pub fn loops(&self) -> &LoopSet {
        &self.loops
    }

    pub fn loop_mode(&self) -> bool {
        self.loop_mode
    }

    /// Tempo one-shots and loops are played at.
    pub fn tempo(&self) -> f64 {
        self.arranger
            .bpm()
            .unwrap_or_else(|| f64::from(self.sequencer.pattern().bpm()))
    }
}

pub struct DrumMachine<B: AudioBackend> {
    graph: SignalGraph<B>,
    kit: Kit,
    playback: PlaybackState,
    library: PatternLibrary,
    take: Vec<f32>,
}

impl<B: AudioBackend> DrumMachine<B> {
    /// A machine with the factory kit and an empty pattern. The output is
    /// not acquired until something needs it.
    pub fn new(backend: B, config: EngineConfig) -> Self {
        let playback = PlaybackState::new(SequencerPattern::default(), config.lookahead);
        Self {
            graph: SignalGraph::new(backend, config),
            kit: factory_kit(),
            playback,
            library: PatternLibrary::new(),
            take: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.graph.config()
    }

    pub fn kit(&self) -> &Kit {
        &self.kit
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn pattern(&self) -> &SequencerPattern {
        self.playback.sequencer.pattern()
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn graph(&self) -> &SignalGraph<B> {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SignalGraph<B> {
        &mut self.graph
    }

    pub fn backend(&self) -> &B {
        self.graph.backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.graph.backend_mut()
    }

    /// Bus counters, once the graph exists.
    pub fn stats(&self) -> Option<&BusStats> {
        self.graph.stats()
    }

    /// Audio-clock time in seconds.
    pub fn now(&self) -> f64 {
        self.graph.now()
    }

    /// Replace every pad at once. A rejected kit leaves the old one in place.
    ///
    /// Loops on pads the new kit lacks are stopped and their queued repeats
    /// cancelled.
    pub fn load_kit(&mut self, kit: Kit) -> Result<(), DrumError> {
        kit.validate()?;
        for pad in self.playback.loops.retain_known(&kit) {
            self.graph.cancel(SourceId::Loop(pad));
        }
        info!(kit = kit.name(), pads = kit.pads().len(), "kit loaded");
        self.kit = kit;
        Ok(())
    }

    /// Play one pad now.
    ///
    /// Builds the graph on first use. If the output is suspended and will
    /// not resume, the trigger is dropped and `Ok` returned.
    pub fn trigger_pad(&mut self, id: PadId, bend_semitones: f32) -> Result<(), DrumError> {
        let pad = self.kit.pad(id).ok_or(ConfigurationError::UnknownPad(id))?;
        if !ready(&mut self.graph)? {
            return Ok(());
        }
        let tempo = self.playback.tempo();
        let Some(mut port) = self.graph.port(SourceId::Manual, tempo) else {
            return Ok(());
        };
        let at = port.now();
        synthesize(pad, at, bend_semitones, &mut port);
        Ok(())
    }

    /// A pad press from the user: toggles a loop in loop mode, otherwise
    /// triggers.
    pub fn pad_pressed(&mut self, id: PadId) -> Result<(), DrumError> {
        if self.playback.loop_mode {
            self.toggle_loop(id).map(|_| ())
        } else {
            self.trigger_pad(id, 0.0)
        }
    }

    pub fn set_loop_mode(&mut self, on: bool) {
        debug!(on, "loop mode");
        self.playback.loop_mode = on;
    }

    /// Start or stop repeating `id`. Returns whether it loops afterwards.
    pub fn toggle_loop(&mut self, id: PadId) -> Result<bool, DrumError> {
        let pad = self.kit.pad(id).ok_or(ConfigurationError::UnknownPad(id))?;
        if self.playback.loops.stop(id) {
            self.graph.cancel(SourceId::Loop(id));
            return Ok(false);
        }
        if !ready(&mut self.graph)? {
            return Ok(false);
        }
        let at = self.graph.now() + self.config().start_delay;
        let tempo = self.playback.tempo();
        Ok(self.playback.loops.toggle(pad, tempo, at))
    }

    /// Stop every loop and cancel their queued repeats.
    pub fn stop_loops(&mut self) {
        for pad in self.playback.loops.stop_all() {
            self.graph.cancel(SourceId::Loop(pad));
        }
    }

    /// Play the current pattern from step 0. Stops a playing song; a
    /// restart drops the steps the previous run had already queued.
    pub fn start_sequencer(&mut self) -> Result<(), DrumError> {
        if !ready(&mut self.graph)? {
            return Ok(());
        }
        self.stop_song();
        if self.playback.sequencer.is_playing() {
            self.stop_sequencer();
        }
        let at = self.graph.now() + self.config().start_delay;
        self.playback.sequencer.start(at);
        Ok(())
    }

    /// Stop and cancel every sequencer voice that has not started yet.
    pub fn stop_sequencer(&mut self) {
        self.playback.sequencer.stop();
        self.graph.cancel(SourceId::Sequencer);
    }

    pub fn toggle_step(&mut self, pad: PadId, step: usize) -> Result<bool, DrumError> {
        if !self.kit.contains(pad) {
            return Err(ConfigurationError::UnknownPad(pad).into());
        }
        Ok(self.playback.sequencer.toggle_step(pad, step)?)
    }

    pub fn clear_pattern(&mut self) {
        self.playback.sequencer.clear();
    }

    /// Change the pattern tempo. Loops follow from their next step.
    pub fn set_bpm(&mut self, bpm: u32) -> Result<(), DrumError> {
        self.playback.sequencer.set_bpm(bpm)?;
        if !self.playback.arranger.is_playing() {
            self.playback.loops.set_bpm(f64::from(bpm));
        }
        Ok(())
    }

    /// Make `pattern` the one the sequencer plays and edits.
    pub fn load_pattern(&mut self, pattern: SequencerPattern) {
        info!(pattern = pattern.id(), bpm = pattern.bpm(), "pattern loaded");
        let bpm = pattern.bpm();
        self.playback.sequencer.load(pattern);
        if !self.playback.arranger.is_playing() {
            self.playback.loops.set_bpm(f64::from(bpm));
        }
    }

    /// Keep a copy of the current pattern in the library songs play from.
    pub fn save_pattern(&mut self) {
        let pattern = self.pattern().clone();
        self.library.insert(pattern.id().to_string(), pattern);
    }

    /// Add a pattern to the library without loading it.
    pub fn add_pattern(&mut self, pattern: SequencerPattern) {
        self.library.insert(pattern.id().to_string(), pattern);
    }

    pub fn store_pattern<S>(&self, store: &mut S) -> Result<(), DrumError>
    where
        S: Store<SequencerPattern>,
    {
        store
            .put(self.pattern().clone())
            .map_err(|err| DrumError::Collaborator(Box::new(err)))
    }

    /// Fetch a pattern from `store`, add it to the library and load it.
    pub fn load_pattern_from<S>(&mut self, store: &S, id: &str) -> Result<(), DrumError>
    where
        S: Store<SequencerPattern>,
    {
        let pattern = store
            .get(id)
            .map_err(|err| DrumError::Collaborator(Box::new(err)))?
            .ok_or_else(|| DrumError::NotFound(id.to_string()))?;
        self.add_pattern(pattern.clone());
        self.load_pattern(pattern);
        Ok(())
    }

    /// Load a generated grid and tempo into the current pattern.
    ///
    /// The result is checked strictly first; on any mismatch the current
    /// pattern is left exactly as it was.
    pub fn apply_generated(&mut self, generated: GeneratedPattern) -> Result<(), DrumError> {
        let (grid, bpm) = generated.validate(&self.kit)?;
        let mut pattern = self.pattern().clone();
        pattern.set_bpm(bpm)?;
        pattern.replace_grid(grid);
        self.load_pattern(pattern);
        Ok(())
    }

    pub fn generate_pattern<G>(&mut self, generator: &mut G, prompt: &str) -> Result<(), DrumError>
    where
        G: PatternGenerator,
    {
        let generated = generator
            .generate_pattern(prompt, &self.kit)
            .map_err(|err| DrumError::Collaborator(Box::new(err)))?;
        self.apply_generated(generated)
    }

    /// Play `arrangement` from its first section. Stops the sequencer.
    pub fn start_song(&mut self, arrangement: SongArrangement) -> Result<(), DrumError> {
        if !ready(&mut self.graph)? {
            return Ok(());
        }
        let at = self.graph.now() + self.config().start_delay;
        let restarting = self.playback.arranger.is_playing();
        self.playback.arranger.start(arrangement, &self.library, at)?;
        if restarting {
            self.graph.cancel(SourceId::Song);
        }
        if self.playback.sequencer.is_playing() {
            self.stop_sequencer();
        }
        if let Some(bpm) = self.playback.arranger.bpm() {
            self.playback.loops.set_bpm(bpm);
        }
        Ok(())
    }

    pub fn stop_song(&mut self) {
        if self.playback.arranger.is_playing() {
            self.playback.arranger.stop();
            self.graph.cancel(SourceId::Song);
        }
    }

    /// Stop sequencer, song and loops.
    pub fn stop_all(&mut self) {
        self.stop_sequencer();
        self.stop_song();
        self.stop_loops();
    }

    /// One control-loop pass: commit every step due within the lookahead,
    /// free retired reverb state and collect recorded samples.
    ///
    /// A song whose next section cannot be resolved is stopped and the
    /// error returned; the rest of the machine keeps running.
    pub fn tick(&mut self) -> Result<TickReport, DrumError> {
        let mut report = TickReport::default();
        if !self.graph.is_built() {
            return Ok(report);
        }
        self.graph.collect_retired();
        let now = self.graph.now();
        let tempo = self.playback.tempo();
        let kit = &self.kit;
        let playback = &mut self.playback;

        if playback.sequencer.is_playing() {
            if let Some(mut port) = self.graph.port(SourceId::Sequencer, tempo) {
                report.merge(playback.sequencer.tick(now, kit, &mut port));
            }
        }

        let mut halted = None;
        if playback.arranger.is_playing() {
            if let Some(mut port) = self.graph.port(SourceId::Song, tempo) {
                match playback.arranger.tick(now, kit, &self.library, &mut port) {
                    Ok(song) => report.merge(song),
                    Err(err) => halted = Some(err),
                }
            }
        }

        if !playback.loops.is_empty() {
            if let Some(mut port) = self.graph.port(SourceId::Manual, tempo) {
                report.merge(playback.loops.tick(now, kit, &mut port));
            }
        }

        if let Some(tap) = self.graph.tap_mut() {
            if tap.is_armed() {
                tap.drain_into(&mut self.take);
            }
        }

        match halted {
            Some(err) => {
                self.graph.cancel(SourceId::Song);
                Err(err.into())
            }
            None => Ok(report),
        }
    }

    pub fn set_master_gain(&mut self, gain: f32) {
        self.graph.set_master_gain(gain);
    }

    pub fn set_reverb_mix(&mut self, mix: f32) {
        self.graph.set_reverb_mix(mix);
    }

    /// Regenerate the reverb tail with a new decay curve.
    pub fn set_reverb_decay(&mut self, decay: f32) {
        let settings = ReverbSettings {
            decay: decay.max(0.01),
            ..self.config().reverb
        };
        self.graph.set_reverb(settings);
    }

    /// Arm the recording tap and start a fresh take.
    pub fn start_recording(&mut self) -> Result<(), DrumError> {
        self.graph.ensure_built()?;
        self.take.clear();
        if let Some(tap) = self.graph.tap_mut() {
            tap.drain();
            tap.arm();
            info!("recording");
        }
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.graph.tap().is_some_and(|tap| tap.is_armed())
    }

    /// Samples collected so far in the current or last take.
    pub fn take(&self) -> &[f32] {
        &self.take
    }

    /// Disarm the tap and hand the take to `encoder`.
    pub fn stop_recording<E>(&mut self, encoder: &mut E) -> Result<Recording, DrumError>
    where
        E: RecordingEncoder,
    {
        let sample_rate = match self.graph.tap_mut() {
            Some(tap) => {
                tap.disarm();
                tap.drain_into(&mut self.take);
                tap.sample_rate()
            }
            None => self.config().sample_rate,
        };
        let recording = encoder
            .encode(&self.take, sample_rate)
            .map_err(|err| DrumError::Collaborator(Box::new(err)))?;
        info!(
            location = %recording.location,
            bytes = recording.byte_size,
            "recording saved"
        );
        Ok(recording)
    }

    /// Pad currently selected by key, if the kit maps it.
    pub fn pad_for_key(&self, key: char) -> Option<&PadConfig> {
        self.kit.pad_for_key(key)
    }
}

/// Build the graph if needed and make sure it is running.
fn ready<B: AudioBackend>(graph: &mut SignalGraph<B>) -> Result<bool, DrumError> {
    graph.ensure_built()?;
    Ok(graph.ensure_running())
}
