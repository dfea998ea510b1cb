use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::ui::field::{render_input, render_text_area};
use crate::ui::item_list;
use crate::ui::theme::{self, source_type_color, ACCENT};
use crate::views::knowledge_form::{FormMode, KnowledgeField, KnowledgeForm};
use crate::views::knowledge_list::{KnowledgeList, ListQuery};

pub fn render_list(f: &mut Frame, area: Rect, view: &KnowledgeList) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(area);

    let search_label = match &view.query {
        ListQuery::Tag(tag) => format!("Search knowledge (tag: #{tag})"),
        _ => "Search knowledge".to_string(),
    };
    render_input(f, rows[0], &search_label, &view.search, view.editing, false);

    let title = match &view.query {
        ListQuery::All => "Knowledge Base".to_string(),
        ListQuery::Search(text) => format!("Results for \"{text}\""),
        ListQuery::Tag(tag) => format!("Tagged #{tag}"),
    };
    if view.items.is_empty() {
        let missing = match view.query {
            ListQuery::All => "No knowledge items found. Press n to create one.",
            _ => "No knowledge items match your search.",
        };
        super::placeholder(f, rows[1], &format!(" {title} "), &view.state, missing);
    } else {
        item_list::render(f, rows[1], &title, &view.items, view.selected, !view.editing);
    }

    let mut status = vec![Span::styled(
        format!(
            "{}  ({} items)",
            view.pagination.label(),
            view.pagination.total_elements
        ),
        theme::label(),
    )];
    if view.state.is_loading() {
        status.push(Span::styled("  loading...", theme::label()));
    } else if let Some(error) = view.state.error() {
        status.push(Span::styled(format!("  {error}"), theme::error()));
    }
    f.render_widget(Paragraph::new(Line::from(status)), rows[2]);
}

pub fn render_form(f: &mut Frame, area: Rect, view: &KnowledgeForm) {
    let title = match &view.mode {
        FormMode::Create => " Create Knowledge Item ",
        FormMode::Edit(_) => " Edit Knowledge Item ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if view.state != crate::views::LoadState::Loaded {
        super::placeholder(f, inner, "", &view.state, "");
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let focus = view.focus();
    for (i, field) in KnowledgeField::ALL.iter().enumerate() {
        let input = view.input(*field);
        let focused = focus == *field;
        if *field == KnowledgeField::Content {
            render_text_area(f, rows[i], field.label(), input, focused);
        } else {
            render_input(f, rows[i], field.label(), input, focused, false);
        }
    }

    let mut tags = vec![
        Span::styled(
            format!("[{}] ", view.source_type.display_name()),
            Style::default().fg(source_type_color(view.source_type)),
        ),
        Span::styled("Tags: ", theme::label()),
    ];
    for (i, tag) in view.tags.iter().enumerate() {
        let style = if view.tag_cursor == Some(i) {
            theme::tag().add_modifier(Modifier::REVERSED)
        } else {
            theme::tag()
        };
        tags.push(Span::styled(format!("#{tag}"), style));
        tags.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(tags)), rows[5]);

    let status = if view.submitting {
        Line::styled("Saving...", theme::label())
    } else if view.error.is_some() {
        super::message_line(view.error.as_deref(), None)
    } else if !view.can_submit() {
        Line::styled("Title and content are required", theme::label())
    } else {
        Line::styled("Ready to save (ctrl+s)", theme::success())
    };
    f.render_widget(Paragraph::new(status), rows[6]);
}
