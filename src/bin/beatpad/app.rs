//! Live session: cpal output, keyboard pads and the control loop.
//!
//! Everything runs on the main thread. Each pass of the event loop ticks the
//! drum machine, redraws, then waits up to one poll interval for input.

use std::io::stdout;
use std::path::PathBuf;
use std::time::Instant;

use beatpad::{
    engine::CpalBackend,
    input::{KeyAction, KeyTriggerMap},
    io::RandomGenerator,
    kit::PadConfig,
    sequencing::{SongArrangement, SongSection, STEPS},
    DrumMachine, EngineConfig, PlaybackMode,
};
use color_eyre::eyre::{Result as EyreResult, WrapErr};
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use ratatui::DefaultTerminal;
use tracing::warn;

use super::ui;
use super::wav::WavEncoder;

/// Quiet time after which a key counts as released on terminals that do not
/// report releases.
const RELEASE_TIMEOUT_MS: u64 = 80;

const PROMPTS: &[&str] = &["boom bap", "fast trap", "slow lofi", "house"];

/// Grid cursor: a row of the step grid and a step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cursor {
    pub row: usize,
    pub step: usize,
}

pub struct App {
    machine: DrumMachine<CpalBackend>,
    keys: KeyTriggerMap,
    cursor: Cursor,
    generator: RandomGenerator,
    prompts: usize,
    encoder: WavEncoder,
    saved: usize,
    status: String,
    should_quit: bool,
}

pub fn run(bpm: u32, seed: u64, recordings: PathBuf) -> EyreResult<()> {
    let backend = CpalBackend::new().wrap_err("failed to open the audio output")?;
    let mut machine = DrumMachine::new(backend, EngineConfig::default());
    machine.set_bpm(bpm)?;

    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    let mut terminal = ratatui::init();
    if enhanced {
        execute!(
            stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let mut app = App::new(machine, enhanced, seed, recordings);
    let result = app.run(&mut terminal);

    if enhanced {
        execute!(stdout(), PopKeyboardEnhancementFlags)?;
    }
    ratatui::restore();
    result
}

impl App {
    fn new(
        machine: DrumMachine<CpalBackend>,
        reports_releases: bool,
        seed: u64,
        recordings: PathBuf,
    ) -> Self {
        let keys = KeyTriggerMap::from_kit(machine.kit());
        let keys = if reports_releases {
            keys
        } else {
            keys.with_release_timeout(std::time::Duration::from_millis(RELEASE_TIMEOUT_MS))
        };
        Self {
            machine,
            keys,
            cursor: Cursor::default(),
            generator: RandomGenerator::new(seed),
            prompts: 0,
            encoder: WavEncoder::new(recordings),
            saved: 0,
            status: "ready".to_string(),
            should_quit: false,
        }
    }

    pub fn machine(&self) -> &DrumMachine<CpalBackend> {
        &self.machine
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Pads shown as grid rows: every single-hit pad, in kit order.
    pub fn grid_pads(&self) -> impl Iterator<Item = &PadConfig> {
        self.machine.kit().pads().iter().filter(|pad| !pad.is_loop())
    }

    fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        let poll = self.machine.config().poll_interval;
        while !self.should_quit {
            self.tick();
            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(poll)? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::FocusLost => self.keys.release_all(),
                    _ => {}
                }
            }
        }
        self.machine.stop_all();
        Ok(())
    }

    fn tick(&mut self) {
        match self.machine.tick() {
            Ok(report) => {
                if let Some(overrun) = report.overrun {
                    self.status = format!("late by {:.0} ms", overrun.late_by * 1000.0);
                }
                if report.halted {
                    self.status = "song finished".to_string();
                }
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let action = match key.kind {
            KeyEventKind::Press => KeyAction::Press,
            KeyEventKind::Repeat => KeyAction::Repeat,
            KeyEventKind::Release => KeyAction::Release,
        };

        if let KeyCode::Char(c) = key.code {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                if c == 'c' && action == KeyAction::Press {
                    self.should_quit = true;
                }
                return;
            }
            if self.keys.pad_for(c).is_some() {
                if let Some(pad) = self.keys.handle(c, action, Instant::now()) {
                    let result = self.machine.pad_pressed(pad);
                    self.report(result);
                }
                return;
            }
        }

        if action == KeyAction::Press {
            self.command(key.code);
        }
    }

    fn command(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => self.toggle_transport(),
            KeyCode::Tab => {
                let on = !self.machine.playback().loop_mode();
                self.machine.set_loop_mode(on);
                self.status = format!("loop mode {}", if on { "on" } else { "off" });
            }
            KeyCode::Up => self.cursor.row = self.cursor.row.saturating_sub(1),
            KeyCode::Down => {
                let rows = self.grid_pads().count();
                self.cursor.row = (self.cursor.row + 1).min(rows.saturating_sub(1));
            }
            KeyCode::Left => self.cursor.step = self.cursor.step.saturating_sub(1),
            KeyCode::Right => self.cursor.step = (self.cursor.step + 1).min(STEPS - 1),
            KeyCode::Enter => self.toggle_cursor_step(),
            KeyCode::Backspace | KeyCode::Delete => {
                self.machine.clear_pattern();
                self.status = "pattern cleared".to_string();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.nudge_bpm(2),
            KeyCode::Char('-') => self.nudge_bpm(-2),
            KeyCode::Char('[') => self.nudge_mix(-0.05),
            KeyCode::Char(']') => self.nudge_mix(0.05),
            KeyCode::Char('{') => self.nudge_decay(-0.5),
            KeyCode::Char('}') => self.nudge_decay(0.5),
            KeyCode::Char(',') => self.nudge_gain(-0.05),
            KeyCode::Char('.') => self.nudge_gain(0.05),
            KeyCode::Char('0') => {
                self.machine.stop_all();
                self.status = "stopped".to_string();
            }
            KeyCode::Char('o') => self.save_pattern(),
            KeyCode::Char('p') => self.toggle_song(),
            KeyCode::Char('n') => self.generate(),
            KeyCode::Char('k') => self.toggle_recording(),
            _ => {}
        }
    }

    fn toggle_transport(&mut self) {
        match self.machine.playback().mode() {
            PlaybackMode::SequencerPlaying => self.machine.stop_sequencer(),
            PlaybackMode::SongPlaying => self.machine.stop_song(),
            PlaybackMode::Idle => {
                let result = self.machine.start_sequencer();
                self.report(result);
            }
        }
    }

    fn toggle_cursor_step(&mut self) {
        let Some(pad) = self.grid_pads().nth(self.cursor.row).map(PadConfig::id) else {
            return;
        };
        let result = self.machine.toggle_step(pad, self.cursor.step).map(|_| ());
        self.report(result);
    }

    fn nudge_bpm(&mut self, delta: i32) {
        let bpm = self.machine.pattern().bpm().saturating_add_signed(delta);
        match self.machine.set_bpm(bpm) {
            Ok(()) => self.status = format!("{bpm} bpm"),
            Err(err) => self.status = err.to_string(),
        }
    }

    fn nudge_mix(&mut self, delta: f32) {
        let mix = (self.machine.config().reverb.mix + delta).clamp(0.0, 1.0);
        self.machine.set_reverb_mix(mix);
        self.status = format!("reverb mix {:.0}%", mix * 100.0);
    }

    fn nudge_decay(&mut self, delta: f32) {
        let decay = (self.machine.config().reverb.decay + delta).clamp(0.5, 8.0);
        self.machine.set_reverb_decay(decay);
        self.status = format!("reverb decay {decay:.1}");
    }

    fn nudge_gain(&mut self, delta: f32) {
        let gain = (self.machine.config().master_gain + delta).clamp(0.0, 1.5);
        self.machine.set_master_gain(gain);
        self.status = format!("master {gain:.2}");
    }

    /// Copy the pattern into the library under a new id.
    fn save_pattern(&mut self) {
        self.saved += 1;
        let id = format!("saved-{}", self.saved);
        let name = format!("Saved {}", self.saved);
        let pattern = self.machine.pattern().clone().renamed(&id, &name);
        self.machine.add_pattern(pattern);
        self.status = format!("saved as {name}");
    }

    /// Play every saved pattern twice, in the order they were saved.
    fn toggle_song(&mut self) {
        if self.machine.playback().mode() == PlaybackMode::SongPlaying {
            self.machine.stop_song();
            return;
        }
        if self.saved == 0 {
            self.save_pattern();
        }
        let song = (1..=self.saved).fold(SongArrangement::new("session", "Session"), |song, n| {
            let id = format!("saved-{n}");
            song.section(SongSection::new(&id, &id, &id, 2))
        });
        let result = self.machine.start_song(song);
        if result.is_ok() {
            self.status = format!("song: {} sections", self.saved);
        }
        self.report(result);
    }

    fn generate(&mut self) {
        let prompt = PROMPTS[self.prompts % PROMPTS.len()];
        self.prompts += 1;
        match self.machine.generate_pattern(&mut self.generator, prompt) {
            Ok(()) => self.status = format!("generated \"{prompt}\""),
            Err(err) => self.status = err.to_string(),
        }
    }

    fn toggle_recording(&mut self) {
        if !self.machine.is_recording() {
            match self.machine.start_recording() {
                Ok(()) => self.status = "recording".to_string(),
                Err(err) => self.status = err.to_string(),
            }
            return;
        }
        match self.machine.stop_recording(&mut self.encoder) {
            Ok(recording) => {
                self.status = format!(
                    "saved {} ({} kB)",
                    recording.location,
                    recording.byte_size / 1024
                )
            }
            Err(err) => {
                warn!(%err, "recording failed");
                self.status = err.to_string();
            }
        }
    }

    fn report<E: std::fmt::Display>(&mut self, result: Result<(), E>) {
        if let Err(err) = result {
            self.status = err.to_string();
        }
    }
}
