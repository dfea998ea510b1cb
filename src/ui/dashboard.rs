use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::item_list;
use crate::ui::theme::{self, ACCENT};
use crate::views::dashboard::{Dashboard, QUICK_ACTIONS};

const QUICK_KEYS: [&str; 3] = ["n", "/", "b"];

pub fn render(f: &mut Frame, area: Rect, view: &Dashboard, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(4),
        ])
        .split(area);

    let welcome = match app.session.current_user() {
        Some(user) => format!("Welcome back, {}!", user.display_name()),
        None => "Welcome back!".to_string(),
    };
    let greeting = Paragraph::new(vec![
        Line::styled(welcome, Style::default().add_modifier(Modifier::BOLD)),
        Line::styled("Here's what's happening with your knowledge base.", theme::label()),
    ])
    .block(Block::default().borders(Borders::BOTTOM).border_style(Style::default().fg(ACCENT)));
    f.render_widget(greeting, rows[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(50),
        ])
        .split(rows[1]);

    stat(f, middle[0], "Total Knowledge", Some(view.total_knowledge));
    stat(f, middle[1], "Knowledge Sources", view.total_sources);

    let actions: Vec<Line> = QUICK_ACTIONS
        .iter()
        .zip(QUICK_KEYS)
        .map(|((name, help), key)| {
            Line::from(vec![
                Span::styled(format!(" {key} "), theme::selected()),
                Span::raw(format!("{name}  ")),
                Span::styled(help.to_string(), theme::label()),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(actions).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .title(" Quick Actions "),
        ),
        middle[2],
    );

    if view.recent.is_empty() {
        super::placeholder(
            f,
            rows[2],
            " Recent Knowledge ",
            &view.state,
            "No knowledge items yet. Press n to create your first one.",
        );
    } else {
        item_list::render(f, rows[2], "Recent Knowledge", &view.recent, view.selected, true);
    }
}

fn stat(f: &mut Frame, area: Rect, label: &str, value: Option<u64>) {
    let shown = value.map_or_else(|| "–".to_string(), |v| v.to_string());
    let paragraph = Paragraph::new(vec![
        Line::styled(
            shown,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Line::styled(label.to_string(), theme::label()),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT)),
    );
    f.render_widget(paragraph, area);
}
