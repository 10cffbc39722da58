//! Terminal layout: transport on top, pads and step grid side by side,
//! status and key help at the bottom.

mod grid;
mod pads;
mod transport;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use super::app::App;

use grid::render_grid;
use pads::render_pads;
use transport::render_transport;

const HELP: &str = " [Space] Play/Stop  [Arrows/Enter] Edit  [Tab] Loop mode  [+/-] BPM  \
[o] Save  [p] Song  [n] Generate  [k] Record  [0] Stop all  [Esc] Quit";

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Transport
            Constraint::Min(8),    // Pads + grid
            Constraint::Length(1), // Status
            Constraint::Length(1), // Help
        ])
        .split(frame.area());

    render_transport(frame, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(40)])
        .split(chunks[1]);
    render_pads(frame, body[0], app);
    render_grid(frame, body[1], app);

    let status = Paragraph::new(format!(" {}", app.status()))
        .style(Style::default().fg(Color::White));
    frame.render_widget(status, chunks[2]);

    let help = Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[3]);
}

/// Map a pad's color name onto the terminal palette.
pub(crate) fn pad_color(name: &str) -> Color {
    match name {
        "red" => Color::Red,
        "orange" => Color::LightRed,
        "yellow" => Color::Yellow,
        "green" => Color::Green,
        "blue" => Color::Blue,
        "purple" | "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        _ => Color::Gray,
    }
}
