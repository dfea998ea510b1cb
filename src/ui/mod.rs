pub mod auth;
pub mod dashboard;
pub mod detail_panel;
pub mod field;
pub mod footer;
pub mod item_list;
pub mod knowledge;
pub mod search;
pub mod sources;
pub mod theme;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Screen};
use crate::ui::theme::{ACCENT, MUTED};
use crate::views::LoadState;

pub fn render(f: &mut Frame, app: &App) {
    let size = f.area();

    // Header (1) + main content + footer (1)
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(size);

    render_header(f, vertical[0], app);

    let main_area = vertical[1];
    match &app.screen {
        Screen::SignIn(view) => auth::render_signin(f, main_area, view),
        Screen::SignUp(view) => auth::render_signup(f, main_area, view),
        Screen::Dashboard(view) => dashboard::render(f, main_area, view, app),
        Screen::KnowledgeList(view) => knowledge::render_list(f, main_area, view),
        Screen::KnowledgeDetail(view) => detail_panel::render(f, main_area, view),
        Screen::KnowledgeForm(view) => knowledge::render_form(f, main_area, view),
        Screen::Search(view) => search::render(f, main_area, view),
        Screen::Sources(view) => sources::render_list(f, main_area, view),
        Screen::SourceDetail(view) => sources::render_detail(f, main_area, view),
        Screen::SourceForm(view) => sources::render_form(f, main_area, view),
    }

    footer::render(f, vertical[2], app);
}

/// App name, the current route string and the signed-in user.
fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let route = app.current_route();
    let left = Line::from(vec![
        Span::styled(
            " Knowledge Base ",
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(route.title(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {route}"), Style::default().fg(MUTED)),
    ]);
    f.render_widget(Paragraph::new(left), area);

    let user = match app.session.current_user() {
        Some(user) => Line::from(vec![
            Span::styled(
                format!(" {} ", user.initial()),
                Style::default().fg(Color::Black).bg(Color::Gray),
            ),
            Span::raw(format!(" {} ", user.display_name())),
        ]),
        None => Line::styled("not signed in ", Style::default().fg(MUTED)),
    };
    f.render_widget(Paragraph::new(user).alignment(Alignment::Right), area);
}

/// Fills `area` with a loading or error message. Used while a screen has
/// nothing to show yet.
pub(crate) fn placeholder(f: &mut Frame, area: Rect, title: &str, state: &LoadState, missing: &str) {
    let line = match state {
        LoadState::Failed(message) => Line::styled(message.clone(), theme::error()),
        LoadState::Loaded => Line::styled(missing.to_string(), theme::label()),
        LoadState::Idle | LoadState::Loading => Line::styled("Loading...", theme::label()),
    };
    let paragraph = Paragraph::new(line)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .title(title.to_string()),
        );
    f.render_widget(paragraph, area);
}

/// A one-line status under a list or form: error, notice, or nothing.
pub(crate) fn message_line(error: Option<&str>, success: Option<&str>) -> Line<'static> {
    match (error, success) {
        (Some(error), _) => Line::styled(error.to_string(), theme::error()),
        (None, Some(success)) => Line::styled(success.to_string(), theme::success()),
        (None, None) => Line::raw(""),
    }
}

/// Centers a box of at most `width` x `height` inside `area`.
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tokio::sync::mpsc;

    use crate::config::PageSizes;
    use crate::model::knowledge::sample_item;
    use crate::model::source::{sample_source, SourceKind};
    use crate::model::user::sample_user;
    use crate::routes::Route;
    use crate::services::tests::{MockAuth, MockKnowledge, MockSources};
    use crate::services::Services;
    use crate::session::temp_session;

    fn draw(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn app(signed_in: bool) -> (tempfile::TempDir, App, mpsc::UnboundedReceiver<crate::app::Action>) {
        let (dir, session) = temp_session();
        if signed_in {
            session.establish("a", "r", &sample_user("ada")).unwrap();
        }
        let session = Arc::new(session);
        let services = Services {
            auth: Arc::new(MockAuth::new(session.clone())),
            knowledge: Arc::new(MockKnowledge::with_items(vec![sample_item("k1", "Deploy runbook")])),
            sources: Arc::new(MockSources::with_sources(vec![sample_source("s1", SourceKind::Github)])),
        };
        let (tx, rx) = mpsc::unbounded_channel();
        (dir, App::new(services, session, PageSizes::default(), tx), rx)
    }

    #[tokio::test]
    async fn signin_screen_renders_fields() {
        let (_dir, mut app, _rx) = app(false);
        app.open(Route::SignIn);
        let screen = draw(&app);
        assert!(screen.contains("Username"));
        assert!(screen.contains("Password"));
        assert!(screen.contains("/auth/signin"));
        assert!(screen.contains("not signed in"));
    }

    #[tokio::test]
    async fn dashboard_renders_counts_and_recent_items() {
        let (_dir, mut app, mut rx) = app(true);
        app.open(Route::Dashboard);
        let action = rx.recv().await.unwrap();
        app.update(action);
        let screen = draw(&app);
        assert!(screen.contains("Deploy runbook"));
        assert!(screen.contains("Total Knowledge"));
        assert!(screen.contains("ada"));
    }

    #[tokio::test]
    async fn source_detail_masks_token() {
        let (_dir, mut app, mut rx) = app(true);
        app.open(Route::SourceView("s1".into()));
        let action = rx.recv().await.unwrap();
        app.update(action);
        let screen = draw(&app);
        assert!(screen.contains("Configured"));
        assert!(!screen.contains("token-s1"));
        assert!(screen.contains("owner-s1"));
    }

    #[tokio::test]
    async fn search_shows_highlighted_fragment_text() {
        let (_dir, mut app, mut rx) = app(true);
        app.open(Route::search("deploy", 0));
        let action = rx.recv().await.unwrap();
        app.update(action);
        let screen = draw(&app);
        assert!(screen.contains("/search?q=deploy"));
        assert!(!screen.contains("<em>"));
        assert!(screen.contains("Deploy runbook"));
    }

    #[test]
    fn centered_box_fits_inside() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered(area, 20, 4), Rect::new(10, 3, 20, 4));
        assert_eq!(centered(area, 80, 40), area);
    }
}
