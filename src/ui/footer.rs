use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, Screen};
use crate::views::knowledge_form::KnowledgeField;
use crate::views::source_form::SourceFocus;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();

    match &app.screen {
        Screen::SignIn(_) => {
            spans.push(hint("tab", "next field"));
            spans.push(hint("enter", "sign in"));
            spans.push(hint("ctrl+n", "sign up"));
            spans.push(hint("ctrl+c", "quit"));
        }
        Screen::SignUp(_) => {
            spans.push(hint("tab", "next field"));
            spans.push(hint("ctrl+s", "create account"));
            spans.push(hint("esc", "sign in"));
        }
        Screen::Dashboard(_) => {
            spans.push(hint("↑↓", "navigate"));
            spans.push(hint("enter", "open"));
            spans.push(hint("n", "create"));
            spans.push(hint("/", "search"));
            spans.push(hint("b", "browse"));
            spans.push(hint("r", "reload"));
        }
        Screen::KnowledgeList(view) if view.editing => {
            spans.push(hint("enter", "search"));
            spans.push(hint("esc", "done"));
        }
        Screen::KnowledgeList(_) => {
            spans.push(hint("↑↓", "navigate"));
            spans.push(hint("←→", "page"));
            spans.push(hint("enter", "open"));
            spans.push(hint("f", "filter"));
            spans.push(hint("n", "new"));
        }
        Screen::KnowledgeDetail(view) if view.confirm_delete => {
            spans.push(hint("y", "delete"));
            spans.push(hint("n", "cancel"));
        }
        Screen::KnowledgeDetail(_) => {
            spans.push(hint("↑↓", "scroll"));
            spans.push(hint("tab", "tag"));
            spans.push(hint("enter", "items with tag"));
            spans.push(hint("e", "edit"));
            spans.push(hint("x", "delete"));
            spans.push(hint("esc", "back"));
        }
        Screen::KnowledgeForm(view) => {
            spans.push(hint("tab", "next field"));
            if view.focus() == KnowledgeField::Tags {
                spans.push(hint("enter", "add tag"));
                spans.push(hint("↑↓", "select tag"));
                spans.push(hint("del", "remove tag"));
            }
            spans.push(hint("ctrl+s", "save"));
            spans.push(hint("esc", "cancel"));
        }
        Screen::Search(view) if view.editing => {
            spans.push(hint("enter", "search"));
            spans.push(hint("esc", "results"));
        }
        Screen::Search(view) if view.show_filters => {
            spans.push(hint("↑↓", "navigate"));
            spans.push(hint("space", "toggle"));
            spans.push(hint("a", "apply"));
            spans.push(hint("c", "clear"));
            spans.push(hint("f", "close"));
        }
        Screen::Search(_) => {
            spans.push(hint("↑↓", "navigate"));
            spans.push(hint("←→", "page"));
            spans.push(hint("enter", "open"));
            spans.push(hint("i", "edit query"));
            spans.push(hint("f", "filters"));
        }
        Screen::Sources(view) if view.pending_delete.is_some() => {
            spans.push(hint("y", "delete"));
            spans.push(hint("n", "cancel"));
        }
        Screen::Sources(_) => {
            spans.push(hint("↑↓", "navigate"));
            spans.push(hint("enter", "open"));
            spans.push(hint("s", "sync"));
            spans.push(hint("e", "edit"));
            spans.push(hint("x", "delete"));
            spans.push(hint("n", "add"));
        }
        Screen::SourceDetail(_) => {
            spans.push(hint("s", "sync"));
            spans.push(hint("e", "edit"));
            spans.push(hint("esc", "back"));
        }
        Screen::SourceForm(view) => {
            spans.push(hint("tab", "next field"));
            match view.focus() {
                SourceFocus::Kind => spans.push(hint("←→", "type")),
                SourceFocus::Active => spans.push(hint("space", "toggle")),
                SourceFocus::Field(_) => {}
            }
            spans.push(hint("ctrl+t", "test"));
            spans.push(hint("ctrl+s", "save"));
            spans.push(hint("esc", "cancel"));
        }
    }

    if !app.screen.is_editing_text() && app.session.is_authenticated() {
        spans.push(hint("1-4", "pages"));
        spans.push(hint("L", "sign out"));
        spans.push(hint("q", "quit"));
    }

    // Flash message
    if let Some((msg, _)) = &app.flash_message {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            msg,
            Style::default().fg(ratatui::style::Color::Yellow),
        ));
    }

    let line = Line::from(spans);
    let paragraph = Paragraph::new(line);
    f.render_widget(paragraph, area);
}

fn hint(key: &str, desc: &str) -> Span<'static> {
    Span::styled(
        format!(" {key}:{desc} "),
        Style::default().fg(ratatui::style::Color::DarkGray),
    )
}
