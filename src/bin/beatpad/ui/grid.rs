//! Step grid editor
//!
//! One row per single-hit pad, sixteen cells grouped in beats. The cursor
//! cell is reversed and the column being played is highlighted.

use beatpad::{engine::STEPS_PER_CYCLE, PlaybackMode};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::pad_color;
use crate::app::App;

pub fn render_grid(frame: &mut Frame, area: Rect, app: &App) {
    let machine = app.machine();
    let playback = machine.playback();
    let pattern = match playback.mode() {
        PlaybackMode::SongPlaying => playback
            .arranger()
            .current_pattern()
            .unwrap_or_else(|| machine.pattern()),
        _ => machine.pattern(),
    };
    let playhead = (playback.mode() != PlaybackMode::Idle)
        .then(|| (playback.current_step() + STEPS_PER_CYCLE - 1) % STEPS_PER_CYCLE);
    let cursor = app.cursor();

    let title = format!(" {} ({} bpm) ", pattern.name(), pattern.bpm());
    let block = Block::default().title(title).borders(Borders::ALL);

    let lines: Vec<Line> = app
        .grid_pads()
        .enumerate()
        .map(|(row, pad)| {
            let mut spans = vec![Span::styled(
                format!(" {:<12}", pad.label()),
                Style::default().fg(pad_color(pad.color())),
            )];
            for step in 0..STEPS_PER_CYCLE {
                if step % 4 == 0 {
                    spans.push(Span::raw(" "));
                }
                let on = pattern.is_set(pad.id(), step);
                let mut style = Style::default().fg(if on { Color::White } else { Color::DarkGray });
                if playhead == Some(step) {
                    style = style.bg(Color::Rgb(60, 60, 20));
                }
                if row == cursor.row && step == cursor.step {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                spans.push(Span::styled(if on { "■ " } else { "· " }, style));
            }
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
