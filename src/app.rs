use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::api::ApiError;
use crate::config::PageSizes;
use crate::event::KeyAction;
use crate::model::knowledge::KnowledgeItem;
use crate::model::page::Page;
use crate::model::search::SearchResponse;
use crate::model::source::{ConnectionTest, KnowledgeSource};
use crate::model::user::User;
use crate::routes::Route;
use crate::services::{LoginResponse, RefreshResponse, Services};
use crate::session::Session;
use crate::views::dashboard::{Dashboard, DashboardData};
use crate::views::input::TextInput;
use crate::views::knowledge_detail::KnowledgeDetail;
use crate::views::knowledge_form::{KnowledgeField, KnowledgeForm};
use crate::views::knowledge_list::KnowledgeList;
use crate::views::search::SearchView;
use crate::views::signin::{SignIn, SIGNUP_NOTICE};
use crate::views::signup::SignUp;
use crate::views::source_detail::{self, SourceDetail};
use crate::views::source_form::{SourceFocus, SourceForm};
use crate::views::sources_list::SourcesList;

pub enum Action {
    Key(KeyAction),
    Tick,
    /// A background request finished; tagged with the screen generation it was issued from.
    Loaded(u64, Response),
    Quit,
}

pub enum Response {
    SignedIn(Result<LoginResponse, ApiError>),
    Registered(Result<User, ApiError>),
    Dashboard(u64, Result<DashboardData, ApiError>),
    KnowledgePage(u64, Result<Page<KnowledgeItem>, ApiError>),
    KnowledgeItem(Result<KnowledgeItem, ApiError>),
    KnowledgeDraft(Result<KnowledgeItem, ApiError>),
    KnowledgeSaved(Result<KnowledgeItem, ApiError>),
    KnowledgeDeleted(Result<(), ApiError>),
    Search(u64, Result<SearchResponse, ApiError>),
    Sources(u64, Result<Page<KnowledgeSource>, ApiError>),
    SourceSynced(Result<(), ApiError>),
    SourceDeleted(String, Result<(), ApiError>),
    Source(Result<KnowledgeSource, ApiError>),
    SourceResynced(Result<KnowledgeSource, ApiError>),
    SourceDraft(Result<KnowledgeSource, ApiError>),
    SourceSaved(Result<KnowledgeSource, ApiError>),
    ConnectionTested(Result<ConnectionTest, ApiError>),
    Refreshed(Result<RefreshResponse, ApiError>),
    LoggedOut(Result<(), ApiError>),
}

impl Response {
    fn error(&self) -> Option<&ApiError> {
        match self {
            Response::SignedIn(r) => r.as_ref().err(),
            Response::Registered(r) => r.as_ref().err(),
            Response::Dashboard(_, r) => r.as_ref().err(),
            Response::KnowledgePage(_, r) => r.as_ref().err(),
            Response::KnowledgeItem(r)
            | Response::KnowledgeDraft(r)
            | Response::KnowledgeSaved(r) => r.as_ref().err(),
            Response::KnowledgeDeleted(r) | Response::SourceSynced(r) => r.as_ref().err(),
            Response::Search(_, r) => r.as_ref().err(),
            Response::Sources(_, r) => r.as_ref().err(),
            Response::SourceDeleted(_, r) => r.as_ref().err(),
            Response::Source(r)
            | Response::SourceResynced(r)
            | Response::SourceDraft(r)
            | Response::SourceSaved(r) => r.as_ref().err(),
            Response::ConnectionTested(r) => r.as_ref().err(),
            Response::Refreshed(r) => r.as_ref().err(),
            Response::LoggedOut(r) => r.as_ref().err(),
        }
    }

    /// Session-wide outcomes apply whatever screen is showing.
    fn is_global(&self) -> bool {
        matches!(self, Response::Refreshed(_) | Response::LoggedOut(_))
    }

    /// A 401 on an authenticated call, as opposed to a failed sign in.
    fn needs_refresh(&self) -> bool {
        !matches!(
            self,
            Response::SignedIn(_) | Response::Registered(_) | Response::Refreshed(_) | Response::LoggedOut(_)
        ) && self.error().is_some_and(ApiError::is_unauthorized)
    }
}

pub enum Screen {
    SignIn(SignIn),
    SignUp(SignUp),
    Dashboard(Dashboard),
    KnowledgeList(KnowledgeList),
    KnowledgeDetail(KnowledgeDetail),
    KnowledgeForm(KnowledgeForm),
    Search(SearchView),
    Sources(SourcesList),
    SourceDetail(SourceDetail),
    SourceForm(SourceForm),
}

impl Screen {
    /// Whether plain letters go to a text input rather than shortcuts.
    pub fn is_editing_text(&self) -> bool {
        match self {
            Screen::SignIn(_) | Screen::SignUp(_) | Screen::KnowledgeForm(_) | Screen::SourceForm(_) => {
                true
            }
            Screen::KnowledgeList(view) => view.editing,
            Screen::Search(view) => view.editing,
            _ => false,
        }
    }
}

pub struct App {
    pub screen: Screen,
    pub route: Route,
    pub session: Arc<Session>,
    pub flash_message: Option<(String, Instant)>,
    pub should_quit: bool,
    pub action_tx: mpsc::UnboundedSender<Action>,
    services: Services,
    pages: PageSizes,
    generation: u64,
    refreshing: bool,
}

fn is_edit_key(key: KeyAction) -> bool {
    matches!(
        key,
        KeyAction::Char(_)
            | KeyAction::Backspace
            | KeyAction::Delete
            | KeyAction::Left
            | KeyAction::Right
            | KeyAction::Home
            | KeyAction::End
    )
}

fn edit_text(input: &mut TextInput, key: KeyAction) {
    match key {
        KeyAction::Char(c) => input.insert(c),
        KeyAction::Backspace => input.backspace(),
        KeyAction::Delete => input.delete(),
        KeyAction::Left => input.left(),
        KeyAction::Right => input.right(),
        KeyAction::Home => input.home(),
        KeyAction::End => input.end(),
        _ => {}
    }
}

impl App {
    pub fn new(
        services: Services,
        session: Arc<Session>,
        pages: PageSizes,
        action_tx: mpsc::UnboundedSender<Action>,
    ) -> Self {
        Self {
            screen: Screen::SignIn(SignIn::new()),
            route: Route::SignIn,
            session,
            flash_message: None,
            should_quit: false,
            action_tx,
            services,
            pages,
            generation: 0,
            refreshing: false,
        }
    }

    fn flash(&mut self, message: impl Into<String>) {
        self.flash_message = Some((message.into(), Instant::now()));
    }

    /// Runs a request in the background and posts its response back.
    fn spawn<F, Fut>(&self, job: F)
    where
        F: FnOnce(Services) -> Fut,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let tx = self.action_tx.clone();
        let generation = self.generation;
        let fut = job(self.services.clone());
        tokio::spawn(async move {
            let response = fut.await;
            let _ = tx.send(Action::Loaded(generation, response));
        });
    }

    /// Replaces the current screen, applying the auth guard, and starts its
    /// initial fetch.
    pub fn open(&mut self, route: Route) {
        let route = route.guard(self.session.is_authenticated());
        self.generation += 1;
        tracing::debug!(route = %route, "Navigate");

        self.screen = match &route {
            Route::SignIn => Screen::SignIn(SignIn::new()),
            Route::SignUp => Screen::SignUp(SignUp::new()),
            Route::Dashboard => {
                let mut view = Dashboard::new(self.pages.dashboard);
                let fetch = view.begin_load();
                self.spawn(move |s| async move { Response::Dashboard(fetch.seq, fetch.run(&s).await) });
                Screen::Dashboard(view)
            }
            Route::KnowledgeList { tag } => {
                let mut view = KnowledgeList::new(self.pages.list, tag.clone());
                let fetch = view.begin_load(0);
                self.spawn(move |s| async move {
                    Response::KnowledgePage(fetch.seq, fetch.run(&*s.knowledge).await)
                });
                Screen::KnowledgeList(view)
            }
            Route::KnowledgeView(id) => {
                let mut view = KnowledgeDetail::new(id.clone());
                let id = view.begin_load();
                self.spawn(move |s| async move { Response::KnowledgeItem(s.knowledge.get(&id).await) });
                Screen::KnowledgeDetail(view)
            }
            Route::KnowledgeCreate => Screen::KnowledgeForm(KnowledgeForm::create()),
            Route::KnowledgeEdit(id) => {
                let mut view = KnowledgeForm::edit(id.clone());
                if let Some(id) = view.begin_load() {
                    self.spawn(move |s| async move { Response::KnowledgeDraft(s.knowledge.get(&id).await) });
                }
                Screen::KnowledgeForm(view)
            }
            Route::Search { query, page } => {
                let (view, fetch) = SearchView::from_route(query.as_deref(), *page, self.pages.search);
                if let Some(fetch) = fetch {
                    self.spawn_search(fetch);
                }
                Screen::Search(view)
            }
            Route::Sources => {
                let mut view = SourcesList::new(self.pages.sources);
                self.spawn_sources(&mut view);
                Screen::Sources(view)
            }
            Route::SourceView(id) => {
                let mut view = SourceDetail::new(id.clone());
                let id = view.begin_load();
                self.spawn(move |s| async move { Response::Source(s.sources.get(&id).await) });
                Screen::SourceDetail(view)
            }
            Route::SourceCreate => Screen::SourceForm(SourceForm::create()),
            Route::SourceEdit(id) => {
                let mut view = SourceForm::edit(id.clone());
                if let Some(id) = view.begin_load() {
                    self.spawn(move |s| async move { Response::SourceDraft(s.sources.get(&id).await) });
                }
                Screen::SourceForm(view)
            }
        };
        self.route = route;
    }

    fn back(&mut self) {
        if let Some(parent) = self.route.parent() {
            self.open(parent);
        }
    }

    /// Route to show in the header; list screens report their live query.
    pub fn current_route(&self) -> Route {
        match &self.screen {
            Screen::Search(view) => view.route(),
            Screen::KnowledgeList(view) => view.route(),
            Screen::KnowledgeForm(view) => view.route(),
            Screen::SourceForm(view) => view.route(),
            _ => self.route.clone(),
        }
    }

    fn spawn_knowledge_page(&self, fetch: crate::views::knowledge_list::ListFetch) {
        self.spawn(move |s| async move {
            Response::KnowledgePage(fetch.seq, fetch.run(&*s.knowledge).await)
        });
    }

    fn spawn_search(&self, fetch: crate::views::search::SearchFetch) {
        self.spawn(move |s| async move { Response::Search(fetch.seq, fetch.run(&*s.knowledge).await) });
    }

    fn spawn_sources(&self, view: &mut SourcesList) {
        let (seq, page) = view.begin_load();
        self.spawn(move |s| async move { Response::Sources(seq, s.sources.list(page).await) });
    }

    fn logout(&mut self) {
        self.spawn(|s| async move { Response::LoggedOut(s.auth.logout().await) });
    }

    pub fn update(&mut self, action: Action) {
        // Clear flash message after 3 seconds
        if let Some((_, t)) = &self.flash_message {
            if t.elapsed().as_secs() >= 3 {
                self.flash_message = None;
            }
        }

        match action {
            Action::Key(key) => self.handle_key(key),
            Action::Tick => {}
            Action::Loaded(generation, response) => {
                if response.needs_refresh() && self.session.is_authenticated() {
                    self.start_refresh();
                }
                if generation != self.generation && !response.is_global() {
                    tracing::debug!(generation, "Dropping response for a closed screen");
                    return;
                }
                self.apply(response);
            }
            Action::Quit => {
                self.should_quit = true;
            }
        }
    }

    /// One refresh attempt per expired session.
    fn start_refresh(&mut self) {
        if self.refreshing {
            return;
        }
        if self.session.refresh_token().is_none() {
            self.expire_session();
            return;
        }
        self.refreshing = true;
        tracing::info!("Access token rejected; refreshing session");
        self.spawn(|s| async move { Response::Refreshed(s.auth.refresh().await) });
    }

    fn expire_session(&mut self) {
        if let Err(e) = self.session.clear() {
            tracing::warn!("Failed to clear session: {e:#}");
        }
        self.open(Route::SignIn);
        self.flash("Session expired. Please sign in again.");
    }

    fn apply(&mut self, response: Response) {
        match response {
            Response::Refreshed(result) => {
                self.refreshing = false;
                match result {
                    Ok(_) => self.flash("Session refreshed. Please try again."),
                    Err(e) => {
                        tracing::warn!("Session refresh failed: {e}");
                        self.expire_session();
                    }
                }
            }
            Response::LoggedOut(result) => {
                if let Err(e) = result {
                    tracing::warn!("Logout failed: {e}");
                }
                self.open(Route::SignIn);
                self.flash("Signed out");
            }
            Response::SignedIn(result) => {
                let Screen::SignIn(view) = &mut self.screen else { return };
                if let Some(route) = view.finish_submit(result) {
                    self.open(route);
                    if let Some(user) = self.session.current_user() {
                        self.flash(format!("Welcome, {}", user.display_name()));
                    }
                }
            }
            Response::Registered(result) => {
                let Screen::SignUp(view) = &mut self.screen else { return };
                if let Some(route) = view.finish_submit(result) {
                    self.open(route);
                    if matches!(self.screen, Screen::SignIn(_)) {
                        self.screen = Screen::SignIn(SignIn::with_notice(SIGNUP_NOTICE));
                    }
                }
            }
            Response::Dashboard(seq, result) => {
                if let Screen::Dashboard(view) = &mut self.screen {
                    view.finish_load(seq, result);
                }
            }
            Response::KnowledgePage(seq, result) => {
                if let Screen::KnowledgeList(view) = &mut self.screen {
                    view.finish_load(seq, result);
                }
            }
            Response::KnowledgeItem(result) => {
                if let Screen::KnowledgeDetail(view) = &mut self.screen {
                    view.finish_load(result);
                }
            }
            Response::KnowledgeDraft(result) => {
                if let Screen::KnowledgeForm(view) = &mut self.screen {
                    view.finish_load(result);
                }
            }
            Response::KnowledgeSaved(result) => {
                let Screen::KnowledgeForm(view) = &mut self.screen else { return };
                if let Some(route) = view.finish_submit(result) {
                    self.open(route);
                    self.flash("Knowledge item saved");
                }
            }
            Response::KnowledgeDeleted(result) => {
                let Screen::KnowledgeDetail(view) = &mut self.screen else { return };
                if let Some(route) = view.finish_delete(result) {
                    self.open(route);
                    self.flash("Knowledge item deleted");
                }
            }
            Response::Search(seq, result) => {
                if let Screen::Search(view) = &mut self.screen {
                    view.finish_search(seq, result);
                }
            }
            Response::Sources(seq, result) => {
                if let Screen::Sources(view) = &mut self.screen {
                    view.finish_load(seq, result);
                }
            }
            Response::SourceSynced(result) => {
                let Screen::Sources(view) = &mut self.screen else { return };
                if view.finish_sync(result) {
                    let (seq, page) = view.begin_load();
                    self.spawn(move |s| async move { Response::Sources(seq, s.sources.list(page).await) });
                    self.flash("Sync completed");
                }
            }
            Response::SourceDeleted(id, result) => {
                let Screen::Sources(view) = &mut self.screen else { return };
                let ok = result.is_ok();
                view.finish_delete(&id, result);
                if ok {
                    self.flash("Source deleted");
                }
            }
            Response::Source(result) => {
                if let Screen::SourceDetail(view) = &mut self.screen {
                    view.finish_load(result);
                }
            }
            Response::SourceResynced(result) => {
                if let Screen::SourceDetail(view) = &mut self.screen {
                    view.finish_sync(result);
                }
            }
            Response::SourceDraft(result) => {
                if let Screen::SourceForm(view) = &mut self.screen {
                    view.finish_load(result);
                }
            }
            Response::SourceSaved(result) => {
                let Screen::SourceForm(view) = &mut self.screen else { return };
                if let Some(route) = view.finish_submit(result) {
                    self.open(route);
                    self.flash("Source saved");
                }
            }
            Response::ConnectionTested(result) => {
                if let Screen::SourceForm(view) = &mut self.screen {
                    view.finish_test(result);
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyAction) {
        if !self.screen.is_editing_text() && self.handle_global_key(key) {
            return;
        }

        match self.screen {
            Screen::SignIn(_) => self.signin_key(key),
            Screen::SignUp(_) => self.signup_key(key),
            Screen::Dashboard(_) => self.dashboard_key(key),
            Screen::KnowledgeList(_) => self.knowledge_list_key(key),
            Screen::KnowledgeDetail(_) => self.knowledge_detail_key(key),
            Screen::KnowledgeForm(_) => self.knowledge_form_key(key),
            Screen::Search(_) => self.search_key(key),
            Screen::Sources(_) => self.sources_key(key),
            Screen::SourceDetail(_) => self.source_detail_key(key),
            Screen::SourceForm(_) => self.source_form_key(key),
        }
    }

    /// Navigation shared by every screen that is not capturing text.
    fn handle_global_key(&mut self, key: KeyAction) -> bool {
        let authenticated = self.session.is_authenticated();
        match key {
            KeyAction::Char('q') => self.should_quit = true,
            KeyAction::Char('1') if authenticated => self.open(Route::Dashboard),
            KeyAction::Char('2') if authenticated => self.open(Route::knowledge()),
            KeyAction::Char('3') if authenticated => self.open(Route::Search {
                query: None,
                page: 0,
            }),
            KeyAction::Char('4') if authenticated => self.open(Route::Sources),
            KeyAction::Char('L') if authenticated => self.logout(),
            _ => return false,
        }
        true
    }

    fn signin_key(&mut self, key: KeyAction) {
        let Screen::SignIn(view) = &mut self.screen else { return };
        match key {
            KeyAction::Tab | KeyAction::Down => view.next_field(),
            KeyAction::BackTab | KeyAction::Up => view.prev_field(),
            KeyAction::Switch => self.open(Route::SignUp),
            KeyAction::Enter | KeyAction::Submit => {
                if let Some(request) = view.begin_submit() {
                    self.spawn(move |s| async move { Response::SignedIn(s.auth.login(&request).await) });
                } else if key == KeyAction::Enter {
                    view.next_field();
                }
            }
            k if is_edit_key(k) => edit_text(view.input_mut(), k),
            _ => {}
        }
    }

    fn signup_key(&mut self, key: KeyAction) {
        let Screen::SignUp(view) = &mut self.screen else { return };
        match key {
            KeyAction::Tab | KeyAction::Down => view.next_field(),
            KeyAction::BackTab | KeyAction::Up => view.prev_field(),
            KeyAction::Switch | KeyAction::Escape => self.open(Route::SignIn),
            KeyAction::Submit => {
                if let Some(request) = view.begin_submit() {
                    self.spawn(move |s| async move { Response::Registered(s.auth.register(&request).await) });
                }
            }
            KeyAction::Enter => view.next_field(),
            k if is_edit_key(k) => edit_text(view.input_mut(), k),
            _ => {}
        }
    }

    fn dashboard_key(&mut self, key: KeyAction) {
        let Screen::Dashboard(view) = &mut self.screen else { return };
        match key {
            KeyAction::Down | KeyAction::Char('j') => view.select_next(),
            KeyAction::Up | KeyAction::Char('k') => view.select_prev(),
            KeyAction::Enter => {
                if let Some(route) = view.open_selected() {
                    self.open(route);
                }
            }
            KeyAction::Char(c @ ('n' | '/' | 'b')) => {
                let index = match c {
                    'n' => 1,
                    '/' => 2,
                    _ => 3,
                };
                if let Some(route) = Dashboard::quick_action(index) {
                    self.open(route);
                }
            }
            KeyAction::Char('r') => self.open(Route::Dashboard),
            _ => {}
        }
    }

    fn knowledge_list_key(&mut self, key: KeyAction) {
        let Screen::KnowledgeList(view) = &mut self.screen else { return };
        if view.editing {
            match key {
                KeyAction::Enter => {
                    let fetch = view.submit_search();
                    self.spawn_knowledge_page(fetch);
                }
                KeyAction::Escape => view.editing = false,
                k if is_edit_key(k) => edit_text(&mut view.search, k),
                _ => {}
            }
            return;
        }
        match key {
            KeyAction::Down | KeyAction::Char('j') => view.select_next(),
            KeyAction::Up | KeyAction::Char('k') => view.select_prev(),
            KeyAction::Enter => {
                if let Some(route) = view.open_selected() {
                    self.open(route);
                }
            }
            KeyAction::Right | KeyAction::PageDown => {
                if let Some(fetch) = view.next_page() {
                    self.spawn_knowledge_page(fetch);
                }
            }
            KeyAction::Left | KeyAction::PageUp => {
                if let Some(fetch) = view.prev_page() {
                    self.spawn_knowledge_page(fetch);
                }
            }
            KeyAction::Char('f') | KeyAction::Char('/') => view.editing = true,
            KeyAction::Char('r') => {
                let fetch = view.begin_load(view.pagination.page);
                self.spawn_knowledge_page(fetch);
            }
            KeyAction::Char('n') => self.open(Route::KnowledgeCreate),
            KeyAction::Escape => self.back(),
            _ => {}
        }
    }

    fn knowledge_detail_key(&mut self, key: KeyAction) {
        let Screen::KnowledgeDetail(view) = &mut self.screen else { return };
        if view.confirm_delete {
            match key {
                KeyAction::Char('y') | KeyAction::Enter => {
                    if let Some(id) = view.begin_delete() {
                        self.spawn(move |s| async move {
                            Response::KnowledgeDeleted(s.knowledge.delete(&id).await)
                        });
                    }
                }
                KeyAction::Char('n') | KeyAction::Escape => view.cancel_delete(),
                _ => {}
            }
            return;
        }
        match key {
            KeyAction::Down | KeyAction::Char('j') => view.scroll_down(),
            KeyAction::Up | KeyAction::Char('k') => view.scroll_up(),
            KeyAction::Tab | KeyAction::Char('t') => view.cycle_tag(),
            KeyAction::Enter => {
                if let Some(route) = view.tag_route() {
                    self.open(route);
                }
            }
            KeyAction::Char('e') => {
                if let Some(route) = view.edit_route() {
                    self.open(route);
                }
            }
            KeyAction::Char('x') | KeyAction::Delete => view.request_delete(),
            KeyAction::Char('r') => {
                let id = view.begin_load();
                self.spawn(move |s| async move { Response::KnowledgeItem(s.knowledge.get(&id).await) });
            }
            KeyAction::Escape => self.back(),
            _ => {}
        }
    }

    fn knowledge_form_key(&mut self, key: KeyAction) {
        let Screen::KnowledgeForm(view) = &mut self.screen else { return };
        let focus = view.focus();
        match key {
            KeyAction::Tab => view.next_field(),
            KeyAction::BackTab => view.prev_field(),
            KeyAction::Escape => self.back(),
            KeyAction::Submit => {
                if let Some(submit) = view.begin_submit() {
                    self.spawn(move |s| async move {
                        Response::KnowledgeSaved(submit.run(&*s.knowledge).await)
                    });
                }
            }
            KeyAction::Enter => match focus {
                KnowledgeField::Tags => {
                    view.add_tag();
                }
                KnowledgeField::Content => view.input_mut().insert('\n'),
                _ => view.next_field(),
            },
            KeyAction::Up | KeyAction::Down if focus == KnowledgeField::Tags => view.cycle_tag(),
            KeyAction::Up => view.prev_field(),
            KeyAction::Down => view.next_field(),
            KeyAction::Delete
                if focus == KnowledgeField::Tags && view.input(KnowledgeField::Tags).value().is_empty() =>
            {
                view.remove_selected_tag();
            }
            k if is_edit_key(k) => edit_text(view.input_mut(), k),
            _ => {}
        }
    }

    fn search_key(&mut self, key: KeyAction) {
        let Screen::Search(view) = &mut self.screen else { return };
        if view.editing {
            match key {
                KeyAction::Enter => {
                    if let Some(fetch) = view.submit() {
                        self.spawn_search(fetch);
                    }
                }
                KeyAction::Escape if view.query.is_empty() => self.back(),
                KeyAction::Escape => view.editing = false,
                k if is_edit_key(k) => edit_text(&mut view.input, k),
                _ => {}
            }
            return;
        }
        if view.show_filters {
            let fetch = match key {
                KeyAction::Down | KeyAction::Char('j') => {
                    view.move_filter_cursor(1);
                    None
                }
                KeyAction::Up | KeyAction::Char('k') => {
                    view.move_filter_cursor(-1);
                    None
                }
                KeyAction::Char(' ') | KeyAction::Enter => {
                    view.toggle_filter_at_cursor();
                    None
                }
                KeyAction::Char('a') => view.apply_filters(),
                KeyAction::Char('c') => view.clear_filters(),
                KeyAction::Char('f') | KeyAction::Escape => {
                    view.show_filters = false;
                    None
                }
                _ => None,
            };
            if let Some(fetch) = fetch {
                self.spawn_search(fetch);
            }
            return;
        }
        match key {
            KeyAction::Down | KeyAction::Char('j') => view.select_next(),
            KeyAction::Up | KeyAction::Char('k') => view.select_prev(),
            KeyAction::Enter => {
                if let Some(route) = view.open_selected() {
                    self.open(route);
                }
            }
            KeyAction::Right | KeyAction::PageDown => {
                if let Some(fetch) = view.next_page() {
                    self.spawn_search(fetch);
                }
            }
            KeyAction::Left | KeyAction::PageUp => {
                if let Some(fetch) = view.prev_page() {
                    self.spawn_search(fetch);
                }
            }
            KeyAction::Char('f') => view.show_filters = true,
            KeyAction::Char('/') | KeyAction::Char('i') => view.editing = true,
            KeyAction::Escape => self.back(),
            _ => {}
        }
    }

    fn sources_key(&mut self, key: KeyAction) {
        let Screen::Sources(view) = &mut self.screen else { return };
        if view.pending_delete.is_some() {
            match key {
                KeyAction::Char('y') | KeyAction::Enter => {
                    if let Some(id) = view.begin_delete() {
                        self.spawn(move |s| async move {
                            let result = s.sources.delete(&id).await;
                            Response::SourceDeleted(id, result)
                        });
                    }
                }
                KeyAction::Char('n') | KeyAction::Escape => view.cancel_delete(),
                _ => {}
            }
            return;
        }
        match key {
            KeyAction::Down | KeyAction::Char('j') => view.select_next(),
            KeyAction::Up | KeyAction::Char('k') => view.select_prev(),
            KeyAction::Enter => {
                if let Some(route) = view.open_selected() {
                    self.open(route);
                }
            }
            KeyAction::Char('e') => {
                if let Some(route) = view.edit_selected() {
                    self.open(route);
                }
            }
            KeyAction::Char('s') => {
                if let Some(id) = view.begin_sync() {
                    self.spawn(move |s| async move { Response::SourceSynced(s.sources.sync(&id).await) });
                }
            }
            KeyAction::Char('x') | KeyAction::Delete => view.request_delete(),
            KeyAction::Char('n') => self.open(Route::SourceCreate),
            KeyAction::Char('r') => {
                let (seq, page) = view.begin_load();
                self.spawn(move |s| async move { Response::Sources(seq, s.sources.list(page).await) });
            }
            KeyAction::Escape => self.back(),
            _ => {}
        }
    }

    fn source_detail_key(&mut self, key: KeyAction) {
        let Screen::SourceDetail(view) = &mut self.screen else { return };
        match key {
            KeyAction::Char('s') => {
                if let Some(id) = view.begin_sync() {
                    self.spawn(move |s| async move {
                        Response::SourceResynced(source_detail::sync_and_reload(&*s.sources, &id).await)
                    });
                }
            }
            KeyAction::Char('e') => {
                if let Some(route) = view.edit_route() {
                    self.open(route);
                }
            }
            KeyAction::Char('r') => {
                let id = view.begin_load();
                self.spawn(move |s| async move { Response::Source(s.sources.get(&id).await) });
            }
            KeyAction::Escape => self.back(),
            _ => {}
        }
    }

    fn source_form_key(&mut self, key: KeyAction) {
        let Screen::SourceForm(view) = &mut self.screen else { return };
        let focus = view.focus();
        match key {
            KeyAction::Tab | KeyAction::Down => view.next_field(),
            KeyAction::BackTab | KeyAction::Up => view.prev_field(),
            KeyAction::Escape => self.back(),
            KeyAction::Test => {
                if let Some(request) = view.begin_test() {
                    self.spawn(move |s| async move {
                        Response::ConnectionTested(s.sources.test_connection(&request).await)
                    });
                }
            }
            KeyAction::Submit => {
                if let Some(submit) = view.begin_submit() {
                    self.spawn(move |s| async move { Response::SourceSaved(submit.run(&*s.sources).await) });
                }
            }
            KeyAction::Enter | KeyAction::Char(' ') | KeyAction::Left | KeyAction::Right
                if focus == SourceFocus::Kind =>
            {
                view.cycle_kind();
            }
            KeyAction::Enter | KeyAction::Char(' ') if focus == SourceFocus::Active => {
                view.toggle_active();
            }
            KeyAction::Enter => view.next_field(),
            k if is_edit_key(k) => {
                if let Some(input) = view.input_mut() {
                    edit_text(input, k);
                }
            }
            _ => {}
        }
    }
}
