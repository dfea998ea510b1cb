use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::ui::field::render_input;
use crate::ui::theme::{self, ACCENT};
use crate::views::signin::{SignIn, SignInField};
use crate::views::signup::{SignUp, SignUpField};

pub fn render_signin(f: &mut Frame, area: Rect, view: &SignIn) {
    let form = super::centered(area, 50, 14);
    f.render_widget(Clear, form);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(" Sign in to your account ");
    let inner = block.inner(form);
    f.render_widget(block, form);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    if let Some(notice) = &view.notice {
        f.render_widget(Paragraph::new(Line::styled(notice.clone(), theme::success())), rows[0]);
    }

    let focus = view.focus();
    render_input(f, rows[1], "Username", &view.username, focus == SignInField::Username, false);
    render_input(f, rows[2], "Password", &view.password, focus == SignInField::Password, true);

    let status = if view.submitting {
        Line::styled("Signing in...", theme::label())
    } else {
        super::message_line(view.error.as_deref(), None)
    };
    f.render_widget(Paragraph::new(status), rows[3]);

    let submit_style = if view.can_submit() {
        theme::selected()
    } else {
        theme::label()
    };
    f.render_widget(
        Paragraph::new(Line::styled("[ Sign in ]", submit_style.add_modifier(Modifier::BOLD))),
        rows[4],
    );
}

pub fn render_signup(f: &mut Frame, area: Rect, view: &SignUp) {
    let form = super::centered(area, 60, 24);
    f.render_widget(Clear, form);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(" Create your account ");
    let inner = block.inner(form);
    f.render_widget(block, form);

    let mut constraints: Vec<Constraint> = SignUpField::ALL.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let focus = view.focus();
    for (i, field) in SignUpField::ALL.iter().enumerate() {
        render_input(
            f,
            rows[i],
            field.label(),
            view.input(*field),
            focus == *field,
            field.is_secret(),
        );
    }

    let status = if view.submitting {
        Line::styled("Creating account...", theme::label())
    } else {
        super::message_line(view.error.as_deref(), None)
    };
    f.render_widget(Paragraph::new(status), rows[SignUpField::ALL.len()]);
}
