mod api;
mod app;
mod cli;
mod config;
mod event;
mod model;
mod routes;
mod services;
mod session;
mod ui;
mod util;
mod views;

use std::io;
use std::panic;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app::{Action, App};
use cli::{Cli, Command};
use config::PageSizes;
use routes::Route;
use services::Services;
use session::{Session, SessionStore};

/// The TUI owns the terminal, so it logs to a file; CLI commands log to stderr.
fn init_tracing(level: &str, to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    if to_file {
        let path = config::log_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config; the command line wins over file and environment
    let mut config = config::load_config()?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.trim_end_matches('/').to_string();
    }

    let tui_route = match &cli.command {
        None => Some(Route::Dashboard),
        Some(Command::Open { route }) => Some(cli::parse_route(route.as_deref())?),
        Some(_) => None,
    };
    init_tracing(&config.log.level, tui_route.is_some())?;
    tracing::debug!(base_url = %config.api.base_url, "Starting");

    let session = Arc::new(Session::load(SessionStore::new())?);
    let client = api::ApiClient::new(config.api.base_url.clone(), session.clone());
    let services = Services::http(client);

    match (tui_route, cli.command) {
        (Some(route), _) => run_tui(services, session, config.pages, route).await,
        (None, Some(command)) => {
            let mut stdout = io::stdout();
            cli::run(command, &services, &session, config.pages, &mut stdout).await
        }
        (None, None) => Ok(()),
    }
}

async fn run_tui(services: Services, session: Arc<Session>, pages: PageSizes, route: Route) -> Result<()> {
    // Set up action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Create app
    let mut app = App::new(services, session, pages, action_tx.clone());

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Spawn event reader
    let event_tx = action_tx.clone();
    tokio::spawn(async move {
        event::run_event_loop(event_tx).await;
    });

    // Initial screen; the auth guard may redirect to sign in
    app.open(route);

    // Main loop
    loop {
        // Render
        terminal.draw(|f| ui::render(f, &app))?;

        // Wait for action
        if let Some(action) = action_rx.recv().await {
            app.update(action);
            if app.should_quit {
                break;
            }
        } else {
            break;
        }
    }

    // Restore terminal
    terminal.show_cursor()?;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}
