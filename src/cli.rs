use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use crate::config::PageSizes;
use crate::model::knowledge::SourceType;
use crate::routes::Route;
use crate::services::{LoginRequest, Services};
use crate::session::Session;
use crate::util::highlight;
use crate::views::knowledge_form::{KnowledgeField, KnowledgeForm};
use crate::views::search::SearchView;
use crate::views::source_detail::sync_and_reload;
use crate::views::sources_list::SourcesList;

#[derive(Parser, Debug)]
#[command(name = "kb", version)]
#[command(about = "Terminal client for the knowledge base")]
pub struct Cli {
    /// API base URL, e.g. http://localhost:8080/api
    #[arg(long, env = "KBASE_API_URL", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Launch the terminal UI, optionally at a route such as /search?q=rust
    Open { route: Option<String> },
    /// Sign in and store the session
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(short, long, env = "KBASE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Ask the server instead of reading the cached profile
        #[arg(long)]
        remote: bool,
    },
    /// Exchange the refresh token for a new access token
    Refresh,
    /// Create a knowledge item
    Add {
        /// Title words; joined with spaces
        #[arg(required = true)]
        title: Vec<String>,
        #[arg(short, long)]
        content: String,
        #[arg(short, long)]
        summary: Option<String>,
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        url: Option<String>,
    },
    /// Full-text search
    Search {
        #[arg(required = true)]
        query: Vec<String>,
        /// 1-based result page
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Restrict to a source type (GITHUB, JIRA, GITLAB, MANUAL); repeatable
        #[arg(long = "source")]
        source_types: Vec<SourceType>,
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
    },
    /// List configured knowledge sources
    Sources,
    /// Sync a knowledge source now
    Sync { id: String },
}

impl Command {
    /// Commands that only make sense with a stored session.
    fn requires_session(&self) -> bool {
        !matches!(
            self,
            Command::Open { .. } | Command::Login { .. } | Command::Logout | Command::Refresh
        )
    }
}

/// Route for `kb open`; the TUI's guard still applies afterwards.
pub fn parse_route(route: Option<&str>) -> Result<Route> {
    match route {
        None => Ok(Route::Dashboard),
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Cannot open {raw}")),
    }
}

/// Prompts on stderr. A terminal gets raw mode so the password is not echoed;
/// piped input is read as one line.
fn prompt_password() -> Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return read_password(&mut stdin.lock());
    }

    enable_raw_mode().context("Failed to read password")?;
    let result = read_hidden(event::read);
    disable_raw_mode()?;
    eprintln!();
    result
}

fn read_password(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn read_hidden(mut next: impl FnMut() -> io::Result<Event>) -> Result<String> {
    let mut password = String::new();
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = next().context("Failed to read password")?
        else {
            continue;
        };
        match code {
            KeyCode::Enter => return Ok(password),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                bail!("Cancelled")
            }
            KeyCode::Char(c) => password.push(c),
            KeyCode::Backspace => {
                password.pop();
            }
            KeyCode::Esc => bail!("Cancelled"),
            _ => {}
        }
    }
}

/// Runs a non-interactive command, writing human-readable output to `out`.
pub async fn run(
    command: Command,
    services: &Services,
    session: &Session,
    pages: PageSizes,
    out: &mut impl Write,
) -> Result<()> {
    if command.requires_session() && !session.is_authenticated() {
        bail!("Not signed in. Run `kb login <username>` first.");
    }

    match command {
        Command::Open { .. } => bail!("`open` launches the terminal UI"),
        Command::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password()?,
            };
            let response = services
                .auth
                .login(&LoginRequest { username, password })
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message("Login failed. Please try again.")))?;
            writeln!(out, "Signed in as {}", response.user.full_name())?;
        }
        Command::Logout => {
            if let Err(e) = services.auth.logout().await {
                tracing::warn!("Logout failed: {e}");
            }
            writeln!(out, "Signed out")?;
        }
        Command::Whoami { remote } => {
            let user = if remote {
                services
                    .auth
                    .current_user()
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message("Failed to load profile")))?
            } else {
                session
                    .current_user()
                    .context("No cached profile; try `kb whoami --remote`")?
            };
            writeln!(out, "{} <{}>", user.full_name(), user.email)?;
            if !user.roles.is_empty() {
                writeln!(out, "Roles: {}", user.roles.join(", "))?;
            }
        }
        Command::Refresh => {
            let response = services
                .auth
                .refresh()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message("Token refresh failed")))?;
            writeln!(out, "Session refreshed for {}", response.user.username)?;
        }
        Command::Add {
            title,
            content,
            summary,
            tags,
            url,
        } => {
            let mut form = KnowledgeForm::create();
            form.field_mut(KnowledgeField::Title).set(title.join(" "));
            form.field_mut(KnowledgeField::Content).set(content);
            form.field_mut(KnowledgeField::Summary).set(summary.unwrap_or_default());
            form.field_mut(KnowledgeField::SourceUrl).set(url.unwrap_or_default());
            for tag in tags {
                form.field_mut(KnowledgeField::Tags).set(tag);
                form.add_tag();
            }
            let Some(submit) = form.begin_submit() else {
                bail!("Title and content are required");
            };
            let result = submit.run(&*services.knowledge).await;
            let created = result.as_ref().ok().map(|item| item.title.clone());
            match (form.finish_submit(result), created) {
                (Some(route), Some(title)) => writeln!(out, "Created \"{title}\" ({route})")?,
                _ => bail!(form.error.unwrap_or_else(|| "Failed to create knowledge item".into())),
            }
        }
        Command::Search {
            query,
            page,
            source_types,
            tags,
        } => {
            let mut view = SearchView::new(pages.search);
            view.input.set(query.join(" "));
            view.query = view.input.trimmed().to_string();
            for source_type in source_types {
                view.toggle_source_type(source_type);
            }
            for tag in &tags {
                view.toggle_tag(tag);
            }
            let Some(fetch) = view.begin_search(page.saturating_sub(1)) else {
                bail!("Search query cannot be empty");
            };
            view.finish_search(fetch.seq, fetch.run(&*services.knowledge).await);
            if let Some(error) = view.state.error() {
                bail!(error.to_string());
            }
            write_search(&view, out)?;
        }
        Command::Sources => {
            let mut list = SourcesList::new(pages.sources);
            let (seq, page) = list.begin_load();
            list.finish_load(seq, services.sources.list(page).await);
            if let Some(error) = list.state.error() {
                bail!(error.to_string());
            }
            if list.sources.is_empty() {
                writeln!(out, "No knowledge sources configured")?;
            }
            for source in &list.sources {
                let status = if source.is_active { "active" } else { "inactive" };
                let synced = source
                    .last_sync
                    .as_ref()
                    .map(|t| t.date_time())
                    .unwrap_or_else(|| "never".to_string());
                writeln!(
                    out,
                    "{}  {:<7} {:<30} {:<8} last sync: {}",
                    source.id,
                    source.kind().display_name(),
                    source.config.headline(),
                    status,
                    synced
                )?;
            }
        }
        Command::Sync { id } => {
            let source = sync_and_reload(&*services.sources, &id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message("Failed to sync source")))?;
            let synced = source
                .last_sync
                .as_ref()
                .map(|t| t.date_time())
                .unwrap_or_else(|| "pending".to_string());
            writeln!(out, "Synced {} (last sync: {synced})", source.config.headline())?;
        }
    }
    Ok(())
}

fn write_search(view: &SearchView, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "{} results for \"{}\" ({})",
        view.pagination.total_elements,
        view.query,
        view.pagination.label()
    )?;
    for result in &view.results {
        let item = &result.knowledge_item;
        writeln!(
            out,
            "\n[{}] {}  {:.0}%  {}",
            item.source_type.display_name(),
            item.title,
            result.score * 100.0,
            Route::KnowledgeView(item.id.clone())
        )?;
        for fragment in result.highlights.iter().take(2) {
            writeln!(out, "  …{}…", highlight::plain_text(fragment))?;
        }
        if !item.tags.is_empty() {
            let tags: Vec<String> = item.tags.iter().map(|t| format!("#{t}")).collect();
            writeln!(out, "  {}", tags.join(" "))?;
        }
    }
    writeln!(out, "\nShare: kb open '{}'", view.route())?;
    Ok(())
}
