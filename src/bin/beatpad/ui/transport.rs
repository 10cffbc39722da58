//! Transport bar: tempo, play state, position, loop mode and bus counters

use beatpad::{engine::STEPS_PER_CYCLE, PlaybackMode};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;

pub fn render_transport(frame: &mut Frame, area: Rect, app: &App) {
    let machine = app.machine();
    let playback = machine.playback();
    let block = Block::default().title(" beatpad ").borders(Borders::ALL);

    let (symbol, state, color) = match playback.mode() {
        PlaybackMode::Idle => ("■", "Stopped".to_string(), Color::Yellow),
        PlaybackMode::SequencerPlaying => ("▶", "Pattern".to_string(), Color::Green),
        PlaybackMode::SongPlaying => {
            let arranger = playback.arranger();
            let section = arranger.section_index().unwrap_or(0) + 1;
            let rep = arranger.repetition().unwrap_or(0) + 1;
            ("▶", format!("Song {section}.{rep}"), Color::Green)
        }
    };
    let step = match playback.mode() {
        PlaybackMode::Idle => 0,
        _ => (playback.current_step() + STEPS_PER_CYCLE - 1) % STEPS_PER_CYCLE + 1,
    };

    let mut spans = vec![
        Span::styled(
            format!(" BPM: {:.0}  ", playback.tempo()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{symbol} {state}  "), Style::default().fg(color)),
        Span::styled(
            format!("Step {step:>2}/16  "),
            Style::default().fg(Color::White),
        ),
    ];
    if playback.loop_mode() {
        spans.push(Span::styled("LOOP  ", Style::default().fg(Color::Magenta)));
    }
    if machine.is_recording() {
        spans.push(Span::styled("● REC  ", Style::default().fg(Color::Red)));
    }
    if let Some(stats) = machine.stats() {
        spans.push(Span::styled(
            format!(
                "voices {}  queued {}  dropped {}",
                stats.active(),
                stats.pending(),
                stats.dropped()
            ),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
