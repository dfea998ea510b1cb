use ratatui::style::{Color, Modifier, Style};

use crate::model::knowledge::SourceType;
use crate::model::source::SourceKind;

pub const ACCENT: Color = Color::Cyan;
pub const MUTED: Color = Color::DarkGray;

pub fn source_type_color(source: SourceType) -> Color {
    match source {
        SourceType::Github => Color::White,
        SourceType::Jira => Color::Rgb(0x00, 0x52, 0xCC),
        SourceType::Gitlab => Color::Rgb(0xFC, 0x6D, 0x26),
        SourceType::Manual => Color::Gray,
    }
}

pub fn source_kind_color(kind: SourceKind) -> Color {
    match kind {
        SourceKind::Github => Color::White,
        SourceKind::Jira => Color::Rgb(0x00, 0x52, 0xCC),
        SourceKind::Gitlab => Color::Rgb(0xFC, 0x6D, 0x26),
    }
}

pub fn active_color(active: bool) -> Color {
    if active {
        Color::Green
    } else {
        Color::Gray
    }
}

pub fn label() -> Style {
    Style::default().fg(Color::Gray)
}

pub fn selected() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn error() -> Style {
    Style::default().fg(Color::Red)
}

pub fn success() -> Style {
    Style::default().fg(Color::Green)
}

pub fn tag() -> Style {
    Style::default().fg(Color::Magenta)
}

pub fn highlight() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}
