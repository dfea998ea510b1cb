use crate::api::ApiError;
use crate::model::knowledge::KnowledgeItem;
use crate::model::page::{Page, PageRequest, Pagination};
use crate::model::search::{SearchRequest, SearchResponse};
use crate::routes::Route;
use crate::services::KnowledgeService;

use super::input::TextInput;
use super::{step, LoadState, RequestSeq};

const LOAD_FAILED: &str = "Failed to load knowledge items";

/// Which listing backs the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListQuery {
    All,
    Search(String),
    Tag(String),
}

pub struct ListFetch {
    pub seq: u64,
    pub query: ListQuery,
    pub page: PageRequest,
}

impl ListFetch {
    /// Runs the listing; search results are reshaped into a plain page.
    pub async fn run(&self, knowledge: &dyn KnowledgeService) -> Result<Page<KnowledgeItem>, ApiError> {
        match &self.query {
            ListQuery::All => knowledge.list(self.page).await,
            ListQuery::Search(text) => knowledge
                .search(&SearchRequest::new(text.clone(), self.page.page, self.page.size))
                .await
                .map(SearchResponse::into_page),
            ListQuery::Tag(tag) => knowledge.by_tag(tag, self.page).await,
        }
    }
}

pub struct KnowledgeList {
    pub search: TextInput,
    pub editing: bool,
    pub query: ListQuery,
    pub items: Vec<KnowledgeItem>,
    pub pagination: Pagination,
    pub state: LoadState,
    pub selected: usize,
    seq: RequestSeq,
}

impl KnowledgeList {
    pub fn new(size: u32, tag: Option<String>) -> Self {
        Self {
            search: TextInput::new(),
            editing: false,
            query: tag.map(ListQuery::Tag).unwrap_or(ListQuery::All),
            items: Vec::new(),
            pagination: Pagination::empty(size),
            state: LoadState::Idle,
            selected: 0,
            seq: RequestSeq::default(),
        }
    }

    pub fn route(&self) -> Route {
        match &self.query {
            ListQuery::Tag(tag) => Route::KnowledgeList {
                tag: Some(tag.clone()),
            },
            _ => Route::knowledge(),
        }
    }

    pub fn begin_load(&mut self, page: u32) -> ListFetch {
        self.state = LoadState::Loading;
        ListFetch {
            seq: self.seq.next(),
            query: self.query.clone(),
            page: PageRequest::new(page, self.pagination.size),
        }
    }

    /// Applies the search box: blank text goes back to the plain listing.
    pub fn submit_search(&mut self) -> ListFetch {
        self.editing = false;
        let text = self.search.trimmed();
        self.query = if text.is_empty() {
            ListQuery::All
        } else {
            ListQuery::Search(text.to_string())
        };
        self.begin_load(0)
    }

    pub fn next_page(&mut self) -> Option<ListFetch> {
        let page = self.pagination.next()?;
        Some(self.begin_load(page))
    }

    pub fn prev_page(&mut self) -> Option<ListFetch> {
        let page = self.pagination.prev()?;
        Some(self.begin_load(page))
    }

    /// Stores a page unless a newer fetch has been issued since.
    /// Failures keep the previous results on screen.
    pub fn finish_load(&mut self, seq: u64, result: Result<Page<KnowledgeItem>, ApiError>) -> bool {
        if !self.seq.is_current(seq) {
            tracing::debug!(seq, "Dropping stale knowledge page");
            return false;
        }
        match result {
            Ok(page) => {
                // Page size stays what this screen asks for even if the server echoes another.
                let size = self.pagination.size;
                self.pagination = Pagination { size, ..Pagination::of(&page) };
                self.items = page.content;
                self.selected = step(self.selected, self.items.len(), 0);
                self.state = LoadState::Loaded;
            }
            Err(e) => self.state = LoadState::Failed(e.user_message(LOAD_FAILED)),
        }
        true
    }

    pub fn select_next(&mut self) {
        self.selected = step(self.selected, self.items.len(), 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = step(self.selected, self.items.len(), -1);
    }

    pub fn open_selected(&self) -> Option<Route> {
        self.items
            .get(self.selected)
            .map(|item| Route::KnowledgeView(item.id.clone()))
    }
}
