//! Pad list: key, label, and whether the pad is looping

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::pad_color;
use crate::app::App;

pub fn render_pads(frame: &mut Frame, area: Rect, app: &App) {
    let machine = app.machine();
    let loops = machine.playback().loops();
    let block = Block::default().title(" Pads ").borders(Borders::ALL);

    let lines: Vec<Line> = machine
        .kit()
        .pads()
        .iter()
        .map(|pad| {
            let looping = loops.is_looping(pad.id());
            let marker = if looping { "↻" } else { " " };
            let label_style = if looping {
                Style::default()
                    .fg(pad_color(pad.color()))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(pad_color(pad.color()))
            };
            Line::from(vec![
                Span::styled(
                    format!(" [{}] ", pad.key_trigger()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(format!("{:<16}", pad.label()), label_style),
                Span::styled(marker, Style::default().fg(Color::Magenta)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
