use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::model::knowledge::KnowledgeItem;
use crate::ui::theme::{self, source_type_color, ACCENT};

/// Two rows per item: title with its source badge, then the excerpt and tags.
pub fn render(
    f: &mut Frame,
    area: Rect,
    title: &str,
    items: &[KnowledgeItem],
    selected: usize,
    focused: bool,
) {
    let max_width = area.width.saturating_sub(4) as usize;
    let rows: Vec<ListItem> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let is_selected = focused && i == selected;
            let title_style = if is_selected {
                theme::selected()
            } else {
                Style::default()
            };

            let mut header = vec![
                Span::styled(
                    format!("[{}] ", item.source_type.display_name()),
                    Style::default().fg(source_type_color(item.source_type)),
                ),
                Span::styled(truncate(&item.title, max_width.saturating_sub(12)), title_style),
            ];
            if let Some(updated) = item.updated_at.as_ref().or(item.created_at.as_ref()) {
                header.push(Span::styled(format!("  {}", updated.date()), theme::label()));
            }

            let mut detail = vec![Span::styled(
                format!("  {}", truncate(&one_line(&item.excerpt()), max_width / 2)),
                theme::label(),
            )];
            for tag in item.tags.iter().take(4) {
                detail.push(Span::styled(format!(" #{tag}"), theme::tag()));
            }

            ListItem::new(vec![Line::from(header), Line::from(detail)])
        })
        .collect();

    let list = List::new(rows).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT))
            .title(format!(" {title} ")),
    );

    let mut state = ListState::default();
    if focused && !items.is_empty() {
        state.select(Some(selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{head}…")
}

pub fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
