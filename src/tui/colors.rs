//! Styles for the terminal user interface.

use ratatui::style::{Color, Modifier, Style};

use crate::fields::{Priority, Status};

/// Header and status bar background.
pub const BAR_BG: Color = Color::Rgb(0, 60, 90);
/// Confirmation dialog background.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);

pub fn priority_style(p: Priority) -> Style {
    match p {
        Priority::High => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::Green),
    }
}

pub fn status_style(s: Status) -> Style {
    match s {
        Status::Pending => Style::default().fg(Color::White),
        Status::InProgress => Style::default().fg(Color::Cyan),
        Status::Completed => Style::default().fg(Color::DarkGray),
        Status::Cancelled => Style::default()
            .fg(Color::Rgb(120, 80, 80))
            .add_modifier(Modifier::CROSSED_OUT),
    }
}
