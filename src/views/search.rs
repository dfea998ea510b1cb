use std::collections::BTreeSet;

use crate::api::ApiError;
use crate::model::knowledge::SourceType;
use crate::model::page::Pagination;
use crate::model::search::{SearchFilters, SearchRequest, SearchResponse, SearchResult};
use crate::routes::Route;
use crate::services::KnowledgeService;

use super::input::TextInput;
use super::{step, LoadState, RequestSeq};

const SEARCH_FAILED: &str = "Search failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOption {
    Source(SourceType),
    Tag(String),
}

pub struct SearchFetch {
    pub seq: u64,
    pub request: SearchRequest,
}

impl SearchFetch {
    pub async fn run(&self, knowledge: &dyn KnowledgeService) -> Result<SearchResponse, ApiError> {
        knowledge.search(&self.request).await
    }
}

pub struct SearchView {
    pub input: TextInput,
    pub editing: bool,
    /// Query and page of the last issued search.
    pub query: String,
    pub page: u32,
    pub source_types: BTreeSet<SourceType>,
    pub tags: BTreeSet<String>,
    pub show_filters: bool,
    pub filter_cursor: usize,
    pub results: Vec<SearchResult>,
    pub pagination: Pagination,
    pub state: LoadState,
    pub selected: usize,
    seq: RequestSeq,
}

impl SearchView {
    pub fn new(size: u32) -> Self {
        Self {
            input: TextInput::new(),
            editing: true,
            query: String::new(),
            page: 0,
            source_types: BTreeSet::new(),
            tags: BTreeSet::new(),
            show_filters: false,
            filter_cursor: 0,
            results: Vec::new(),
            pagination: Pagination::empty(size),
            state: LoadState::Idle,
            selected: 0,
            seq: RequestSeq::default(),
        }
    }

    /// Restores a screen from `/search?q=..&page=..`, searching right away
    /// when the route carries a query.
    pub fn from_route(query: Option<&str>, page: u32, size: u32) -> (Self, Option<SearchFetch>) {
        let mut view = Self::new(size);
        let Some(query) = query else {
            return (view, None);
        };
        view.input.set(query);
        view.editing = false;
        view.query = query.trim().to_string();
        let fetch = view.begin_search(page);
        (view, fetch)
    }

    pub fn route(&self) -> Route {
        if self.query.is_empty() {
            Route::Search {
                query: None,
                page: 0,
            }
        } else {
            Route::search(self.query.clone(), self.page)
        }
    }

    /// Searches the current query at `page`; a blank query issues nothing.
    pub fn begin_search(&mut self, page: u32) -> Option<SearchFetch> {
        if self.query.trim().is_empty() {
            return None;
        }
        self.page = page;
        self.state = LoadState::Loading;
        let mut request = SearchRequest::new(self.query.trim(), page, self.pagination.size);
        let filters = SearchFilters::from_sets(&self.source_types, &self.tags);
        request.filters = Some(filters).filter(|f| !f.is_empty());
        Some(SearchFetch {
            seq: self.seq.next(),
            request,
        })
    }

    pub fn submit(&mut self) -> Option<SearchFetch> {
        self.editing = false;
        self.query = self.input.trimmed().to_string();
        self.begin_search(0)
    }

    pub fn next_page(&mut self) -> Option<SearchFetch> {
        let page = self.pagination.next()?;
        self.begin_search(page)
    }

    pub fn prev_page(&mut self) -> Option<SearchFetch> {
        let page = self.pagination.prev()?;
        self.begin_search(page)
    }

    pub fn toggle_source_type(&mut self, source_type: SourceType) {
        if !self.source_types.remove(&source_type) {
            self.source_types.insert(source_type);
        }
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        if !self.tags.remove(tag) {
            self.tags.insert(tag.to_string());
        }
    }

    pub fn apply_filters(&mut self) -> Option<SearchFetch> {
        self.begin_search(0)
    }

    pub fn clear_filters(&mut self) -> Option<SearchFetch> {
        self.source_types.clear();
        self.tags.clear();
        self.begin_search(0)
    }

    /// Every source type, then the tags seen in the current results plus any
    /// tag already selected.
    pub fn filter_options(&self) -> Vec<FilterOption> {
        let mut tags: BTreeSet<&str> = self.tags.iter().map(String::as_str).collect();
        for result in &self.results {
            tags.extend(result.knowledge_item.tags.iter().map(String::as_str));
        }
        SourceType::ALL
            .iter()
            .map(|t| FilterOption::Source(*t))
            .chain(tags.into_iter().map(|t| FilterOption::Tag(t.to_string())))
            .collect()
    }

    pub fn is_filter_selected(&self, option: &FilterOption) -> bool {
        match option {
            FilterOption::Source(t) => self.source_types.contains(t),
            FilterOption::Tag(tag) => self.tags.contains(tag),
        }
    }

    pub fn move_filter_cursor(&mut self, delta: isize) {
        self.filter_cursor = step(self.filter_cursor, self.filter_options().len(), delta);
    }

    pub fn toggle_filter_at_cursor(&mut self) {
        match self.filter_options().get(self.filter_cursor) {
            Some(FilterOption::Source(t)) => self.toggle_source_type(*t),
            Some(FilterOption::Tag(tag)) => self.toggle_tag(tag),
            None => {}
        }
    }

    /// Applies a response unless a newer search has been issued since.
    /// A failed search clears the results.
    pub fn finish_search(&mut self, seq: u64, result: Result<SearchResponse, ApiError>) -> bool {
        if !self.seq.is_current(seq) {
            tracing::debug!(seq, "Dropping stale search response");
            return false;
        }
        match result {
            Ok(response) => {
                let size = self.pagination.size;
                self.pagination = Pagination {
                    size,
                    ..response.pagination()
                };
                self.page = self.pagination.page;
                self.results = response.results;
                self.selected = step(self.selected, self.results.len(), 0);
                self.state = LoadState::Loaded;
            }
            Err(e) => {
                self.results.clear();
                self.pagination = Pagination::empty(self.pagination.size);
                self.state = LoadState::Failed(e.user_message(SEARCH_FAILED));
            }
        }
        true
    }

    pub fn select_next(&mut self) {
        self.selected = step(self.selected, self.results.len(), 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = step(self.selected, self.results.len(), -1);
    }

    pub fn open_selected(&self) -> Option<Route> {
        self.results
            .get(self.selected)
            .map(|r| Route::KnowledgeView(r.knowledge_item.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::knowledge::sample_item;
    use crate::services::tests::MockKnowledge;
    use reqwest::StatusCode;

    fn mock() -> MockKnowledge {
        let items = (1..=25)
            .map(|i| {
                let mut item = sample_item(&format!("k{i}"), &format!("Kafka note {i}"));
                item.tags = vec![format!("t{}", i % 3)];
                item
            })
            .collect();
        MockKnowledge::with_items(items)
    }

    async fn run(view: &mut SearchView, svc: &MockKnowledge, fetch: SearchFetch) {
        let result = fetch.run(svc).await;
        view.finish_search(fetch.seq, result);
    }

    #[tokio::test]
    async fn route_reproduces_result_page() {
        let svc = mock();
        let mut view = SearchView::new(10);
        view.input.set("kafka");
        let fetch = view.submit().unwrap();
        run(&mut view, &svc, fetch).await;
        let fetch = view.next_page().unwrap();
        run(&mut view, &svc, fetch).await;

        let route = view.route();
        assert_eq!(route.to_string(), "/search?q=kafka&page=2");

        let Route::Search { query, page } = route.to_string().parse::<Route>().unwrap() else {
            panic!("not a search route");
        };
        let (mut shared, fetch) = SearchView::from_route(query.as_deref(), page, 10);
        run(&mut shared, &svc, fetch.unwrap()).await;

        assert_eq!(shared.pagination, view.pagination);
        let ids = |v: &SearchView| -> Vec<String> {
            v.results.iter().map(|r| r.knowledge_item.id.clone()).collect()
        };
        assert_eq!(ids(&shared), ids(&view));
    }

    #[test]
    fn blank_query_issues_nothing() {
        let mut view = SearchView::new(10);
        view.input.set("   ");
        assert!(view.submit().is_none());
        assert!(view.apply_filters().is_none());
        let (_, fetch) = SearchView::from_route(None, 3, 10);
        assert!(fetch.is_none());
    }

    #[test]
    fn filters_toggle_and_reset_to_first_page() {
        let mut view = SearchView::new(10);
        view.query = "kafka".into();
        view.page = 2;

        view.toggle_source_type(SourceType::Jira);
        view.toggle_tag("t1");
        view.toggle_source_type(SourceType::Github);
        view.toggle_source_type(SourceType::Github);

        let fetch = view.apply_filters().unwrap();
        assert_eq!(fetch.request.page, Some(0));
        let filters = fetch.request.filters.unwrap();
        assert_eq!(filters.source_type, Some(vec![SourceType::Jira]));
        assert_eq!(filters.tags, Some(vec!["t1".to_string()]));

        let fetch = view.clear_filters().unwrap();
        assert_eq!(fetch.request.filters, None);
        assert!(view.source_types.is_empty() && view.tags.is_empty());
    }

    #[tokio::test]
    async fn filter_options_include_result_tags() {
        let svc = mock();
        let mut view = SearchView::new(10);
        view.input.set("kafka");
        let fetch = view.submit().unwrap();
        run(&mut view, &svc, fetch).await;

        let options = view.filter_options();
        assert_eq!(options.len(), 4 + 3);
        assert_eq!(options[4], FilterOption::Tag("t0".into()));

        view.filter_cursor = 5;
        view.toggle_filter_at_cursor();
        assert!(view.is_filter_selected(&FilterOption::Tag("t1".into())));
    }

    #[tokio::test]
    async fn stale_and_failed_searches() {
        let svc = mock();
        let mut view = SearchView::new(10);
        view.input.set("kafka");
        let old = view.submit().unwrap();
        view.input.set("note 2");
        let new = view.submit().unwrap();

        run(&mut view, &svc, new).await;
        let stale = old.run(&svc).await;
        assert!(!view.finish_search(old.seq, stale));
        assert_eq!(view.query, "note 2");
        assert_eq!(view.pagination.total_elements, 7);

        svc.fail_with(StatusCode::INTERNAL_SERVER_ERROR, None);
        let fetch = view.begin_search(0).unwrap();
        run(&mut view, &svc, fetch).await;
        assert!(view.results.is_empty());
        assert_eq!(view.state.error(), Some(SEARCH_FAILED));
    }
}
