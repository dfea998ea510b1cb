use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::ui::theme::{ACCENT, MUTED};
use crate::views::input::TextInput;

/// A bordered single-line input. The focused field gets the accent border
/// and the terminal cursor.
pub fn render_input(
    f: &mut Frame,
    area: Rect,
    label: &str,
    input: &TextInput,
    focused: bool,
    secret: bool,
) {
    let shown = if secret {
        input.masked()
    } else {
        input.value().to_string()
    };
    let border = if focused { ACCENT } else { MUTED };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(format!(" {label} "));

    let paragraph = Paragraph::new(Line::from(Span::raw(shown))).block(block);
    f.render_widget(paragraph, area);

    if focused {
        place_cursor(f, area, input.cursor() as u16, 0);
    }
}

/// Multi-line variant used for item content; the cursor goes on the last line.
pub fn render_text_area(f: &mut Frame, area: Rect, label: &str, input: &TextInput, focused: bool) {
    let border = if focused { ACCENT } else { MUTED };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(format!(" {label} "));

    let lines: Vec<Line> = input.value().split('\n').map(Line::raw).collect();
    let last_row = lines.len().saturating_sub(1) as u16;
    let last_width = input
        .value()
        .rsplit('\n')
        .next()
        .map(|l| l.chars().count())
        .unwrap_or(0) as u16;

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);

    if focused {
        place_cursor(f, area, last_width, last_row);
    }
}

fn place_cursor(f: &mut Frame, area: Rect, col: u16, row: u16) {
    if area.width < 3 || area.height < 3 {
        return;
    }
    let x = area.x + 1 + col;
    let y = area.y + 1 + row;
    f.set_cursor_position((
        x.min(area.x + area.width - 2),
        y.min(area.y + area.height - 2),
    ));
}
