use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::ui::theme::{self, source_type_color, ACCENT};
use crate::views::knowledge_detail::KnowledgeDetail;

pub fn render(f: &mut Frame, area: Rect, view: &KnowledgeDetail) {
    let Some(item) = &view.item else {
        super::placeholder(f, area, " Knowledge ", &view.state, "Knowledge item not found");
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let mut info: Vec<Line> = vec![Line::from(vec![
        Span::styled(
            format!("[{}] ", item.source_type.display_name()),
            Style::default().fg(source_type_color(item.source_type)),
        ),
        Span::styled(item.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
    ])];

    if let Some(author) = &item.author {
        info.push(field("Author: ", author.full_name()));
    }
    if let Some(created) = &item.created_at {
        let mut line = field("Created: ", created.date_time());
        if let Some(updated) = &item.updated_at {
            line.spans.push(Span::styled("  Updated: ", theme::label()));
            line.spans.push(Span::raw(updated.date_time()));
        }
        info.push(line);
    }
    if let Some(url) = &item.source_url {
        info.push(Line::from(vec![
            Span::styled("Source: ", theme::label()),
            Span::styled(url.clone(), Style::default().fg(ratatui::style::Color::Blue)),
        ]));
    }

    let mut tags = vec![Span::styled("Tags: ", theme::label())];
    if item.tags.is_empty() {
        tags.push(Span::styled("none", theme::label()));
    }
    for (i, tag) in item.tags.iter().enumerate() {
        let style = if view.tag_cursor == Some(i) {
            theme::selected().add_modifier(Modifier::REVERSED)
        } else {
            theme::tag()
        };
        tags.push(Span::styled(format!("#{tag}"), style));
        tags.push(Span::raw(" "));
    }
    info.push(Line::from(tags));

    let header = Paragraph::new(info).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT))
            .title(" Knowledge "),
    );
    f.render_widget(header, chunks[0]);

    let mut body: Vec<Line> = Vec::new();
    if let Some(summary) = &item.summary {
        body.push(Line::styled(summary.clone(), Style::default().add_modifier(Modifier::ITALIC)));
        body.push(Line::raw(""));
    }
    body.extend(item.content.lines().map(|l| Line::raw(l.to_string())));

    if !item.metadata.is_empty() {
        body.push(Line::raw(""));
        body.push(Line::styled("Metadata", theme::label().add_modifier(Modifier::BOLD)));
        for (key, value) in item.metadata.entries() {
            body.push(field(&format!("{key}: "), value));
        }
    }

    let content = Paragraph::new(body)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .title(" Content "),
        )
        .wrap(Wrap { trim: false })
        .scroll((view.scroll, 0));
    f.render_widget(content, chunks[1]);

    let status = if view.confirm_delete {
        Line::styled(
            format!("Delete \"{}\"? This cannot be undone. (y/n)", item.title),
            theme::error().add_modifier(Modifier::BOLD),
        )
    } else if view.deleting {
        Line::styled("Deleting...", theme::label())
    } else if let Some(error) = &view.action_error {
        Line::styled(error.clone(), theme::error())
    } else {
        Line::raw("")
    };
    f.render_widget(Paragraph::new(status), chunks[2]);
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(label.to_string(), theme::label()),
        Span::raw(value),
    ])
}
