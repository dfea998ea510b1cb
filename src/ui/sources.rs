use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::model::source::{KnowledgeSource, SourceKind};
use crate::ui::field::render_input;
use crate::ui::theme::{self, active_color, source_kind_color, ACCENT, MUTED};
use crate::views::source_detail::SourceDetail;
use crate::views::source_form::{SourceFocus, SourceForm};
use crate::views::sources_list::SourcesList;
use crate::views::LoadState;

fn kind_badge(kind: SourceKind) -> Span<'static> {
    Span::styled(
        format!("[{}] ", kind.display_name()),
        Style::default().fg(source_kind_color(kind)),
    )
}

fn active_badge(active: bool) -> Span<'static> {
    let text = if active { " Active " } else { " Inactive " };
    Span::styled(text, Style::default().fg(active_color(active)))
}

fn last_sync(source: &KnowledgeSource) -> String {
    source
        .last_sync
        .as_ref()
        .map(|t| t.date_time())
        .unwrap_or_else(|| "Never".to_string())
}

pub fn render_list(f: &mut Frame, area: Rect, view: &SourcesList) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(1)])
        .split(area);

    if view.sources.is_empty() {
        super::placeholder(
            f,
            rows[0],
            " Knowledge Sources ",
            &view.state,
            "No knowledge sources configured. Press n to add one.",
        );
    } else {
        let items: Vec<ListItem> = view
            .sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let title_style = if i == view.selected {
                    theme::selected()
                } else {
                    Style::default()
                };
                let syncing = view.syncing_id.as_deref() == Some(source.id.as_str());
                let mut header = vec![
                    kind_badge(source.kind()),
                    Span::styled(source.config.headline(), title_style),
                    active_badge(source.is_active),
                ];
                if syncing {
                    header.push(Span::styled(" syncing...", Style::default().fg(ACCENT)));
                }
                let detail = Line::styled(format!("  Last sync: {}", last_sync(source)), theme::label());
                ListItem::new(vec![Line::from(header), detail])
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .title(format!(" Knowledge Sources ({}) ", view.total)),
        );
        let mut state = ListState::default();
        state.select(Some(view.selected));
        f.render_stateful_widget(list, rows[0], &mut state);
    }

    let status = if let Some(source) = &view.pending_delete {
        Line::styled(
            format!(
                "Delete {} source \"{}\"? (y/n)",
                source.kind().display_name(),
                source.config.headline()
            ),
            theme::error().add_modifier(Modifier::BOLD),
        )
    } else if view.deleting {
        Line::styled("Deleting...", theme::label())
    } else if let Some(error) = view.action_error.as_deref().or(view.state.error()) {
        Line::styled(error.to_string(), theme::error())
    } else {
        Line::raw("")
    };
    f.render_widget(Paragraph::new(status), rows[1]);
}

pub fn render_detail(f: &mut Frame, area: Rect, view: &SourceDetail) {
    let Some(source) = &view.source else {
        super::placeholder(f, area, " Knowledge Source ", &view.state, "Knowledge source not found");
        return;
    };

    let mut lines = vec![
        Line::from(vec![
            kind_badge(source.kind()),
            Span::styled(
                source.config.headline(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            active_badge(source.is_active),
        ]),
        Line::raw(""),
    ];
    for (label, value) in source.config.summary() {
        lines.push(Line::from(vec![
            Span::styled(format!("{label}: "), theme::label()),
            Span::raw(value),
        ]));
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::styled("Last sync: ", theme::label()),
        Span::raw(last_sync(source)),
    ]));
    if let Some(created) = &source.created_at {
        lines.push(Line::from(vec![
            Span::styled("Created: ", theme::label()),
            Span::raw(created.date_time()),
        ]));
    }
    if let Some(updated) = &source.updated_at {
        lines.push(Line::from(vec![
            Span::styled("Updated: ", theme::label()),
            Span::raw(updated.date_time()),
        ]));
    }
    lines.push(Line::raw(""));
    if view.syncing {
        lines.push(Line::styled("Syncing...", Style::default().fg(ACCENT)));
    } else if let Some(error) = &view.action_error {
        lines.push(Line::styled(error.clone(), theme::error()));
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .title(" Knowledge Source "),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

pub fn render_form(f: &mut Frame, area: Rect, view: &SourceForm) {
    let title = if view.editing.is_some() {
        " Edit Knowledge Source "
    } else {
        " Add Knowledge Source "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if view.state != LoadState::Loaded {
        super::placeholder(f, inner, "", &view.state, "");
        return;
    }

    let fields = view.fields();
    let mut constraints = vec![Constraint::Length(1)];
    constraints.extend(fields.iter().map(|_| Constraint::Length(3)));
    constraints.extend([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ]);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let focus = view.focus();
    let kind_style = if focus == SourceFocus::Kind {
        theme::selected()
    } else {
        Style::default()
    };
    let mut kind_line = vec![Span::styled("Source Type: ", theme::label())];
    for kind in SourceKind::ALL {
        let style = if kind == view.kind() {
            kind_style.fg(source_kind_color(kind)).add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(MUTED)
        };
        kind_line.push(Span::styled(format!(" {} ", kind.display_name()), style));
    }
    if view.editing.is_some() {
        kind_line.push(Span::styled("  (fixed)", theme::label()));
    }
    f.render_widget(Paragraph::new(Line::from(kind_line)), rows[0]);

    for (i, field) in fields.iter().enumerate() {
        let Some(input) = view.input(i) else { continue };
        let label = if field.required {
            format!("{} *", field.label)
        } else {
            field.label.to_string()
        };
        render_input(f, rows[i + 1], &label, input, focus == SourceFocus::Field(i), field.secret);
    }

    let after = fields.len() + 1;
    let help = match focus {
        SourceFocus::Field(i) => fields.get(i).map(|c| c.help).unwrap_or(""),
        SourceFocus::Kind => "Changing the type clears the configuration",
        SourceFocus::Active => "Inactive sources are skipped by sync",
    };
    f.render_widget(Paragraph::new(Line::styled(help, theme::label())), rows[after]);

    let active_style = if focus == SourceFocus::Active {
        theme::selected()
    } else {
        Style::default()
    };
    let checkbox = if view.is_active { "[x]" } else { "[ ]" };
    f.render_widget(
        Paragraph::new(Line::styled(format!("{checkbox} Active"), active_style)),
        rows[after + 1],
    );

    let status = if view.testing {
        Line::styled("Testing connection...", theme::label())
    } else if view.submitting {
        Line::styled("Saving...", theme::label())
    } else if view.error.is_some() || view.success.is_some() {
        super::message_line(view.error.as_deref(), view.success.as_deref())
    } else {
        let missing = view.missing_fields();
        if missing.is_empty() {
            Line::styled("Ready: ctrl+t test connection, ctrl+s save", theme::success())
        } else {
            Line::styled(format!("Required: {}", missing.join(", ")), theme::label())
        }
    };
    f.render_widget(Paragraph::new(status), rows[after + 2]);
}
