use crate::api::ApiError;
use crate::model::knowledge::KnowledgeItem;
use crate::model::page::{Page, PageRequest};
use crate::model::source::KnowledgeSource;
use crate::routes::Route;
use crate::services::Services;

use super::{step, LoadState, RequestSeq};

const LOAD_FAILED: &str = "Failed to load dashboard";

/// Shortcuts shown under the statistics.
pub const QUICK_ACTIONS: [(&str, &str); 3] = [
    ("Create Knowledge", "Add new knowledge item"),
    ("Search Knowledge", "Find existing knowledge"),
    ("Browse All", "View all knowledge items"),
];

pub struct DashboardFetch {
    pub seq: u64,
    recent: PageRequest,
}

pub struct DashboardData {
    pub recent: Page<KnowledgeItem>,
    pub sources: Option<Page<KnowledgeSource>>,
}

impl DashboardFetch {
    /// Only the recent-items call decides success; a failed sources count
    /// leaves that total unknown.
    pub async fn run(&self, services: &Services) -> Result<DashboardData, ApiError> {
        let (recent, sources) = futures::join!(
            services.knowledge.list(self.recent),
            services.sources.list(PageRequest::new(0, 1)),
        );
        let sources = match sources {
            Ok(page) => Some(page),
            Err(e) => {
                tracing::warn!(error = %e, "Source count unavailable");
                None
            }
        };
        Ok(DashboardData {
            recent: recent?,
            sources,
        })
    }
}

pub struct Dashboard {
    pub recent: Vec<KnowledgeItem>,
    pub total_knowledge: u64,
    pub total_sources: Option<u64>,
    pub state: LoadState,
    pub selected: usize,
    size: u32,
    seq: RequestSeq,
}

impl Dashboard {
    pub fn new(size: u32) -> Self {
        Self {
            recent: Vec::new(),
            total_knowledge: 0,
            total_sources: None,
            state: LoadState::Idle,
            selected: 0,
            size,
            seq: RequestSeq::default(),
        }
    }

    pub fn begin_load(&mut self) -> DashboardFetch {
        self.state = LoadState::Loading;
        DashboardFetch {
            seq: self.seq.next(),
            recent: PageRequest::new(0, self.size),
        }
    }

    pub fn finish_load(&mut self, seq: u64, result: Result<DashboardData, ApiError>) {
        if !self.seq.is_current(seq) {
            return;
        }
        match result {
            Ok(data) => {
                self.total_knowledge = data.recent.total_elements;
                self.total_sources = data.sources.map(|page| page.total_elements);
                self.recent = data.recent.content;
                self.selected = step(self.selected, self.recent.len(), 0);
                self.state = LoadState::Loaded;
            }
            Err(e) => self.state = LoadState::Failed(e.user_message(LOAD_FAILED)),
        }
    }

    pub fn select_next(&mut self) {
        self.selected = step(self.selected, self.recent.len(), 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = step(self.selected, self.recent.len(), -1);
    }

    pub fn open_selected(&self) -> Option<Route> {
        self.recent
            .get(self.selected)
            .map(|item| Route::KnowledgeView(item.id.clone()))
    }

    /// Route behind the numbered quick action (1-based).
    pub fn quick_action(index: usize) -> Option<Route> {
        match index {
            1 => Some(Route::KnowledgeCreate),
            2 => Some(Route::Search {
                query: None,
                page: 0,
            }),
            3 => Some(Route::knowledge()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::knowledge::sample_item;
    use crate::model::source::{sample_source, SourceKind};
    use crate::services::tests::{MockAuth, MockKnowledge, MockSources};
    use crate::session::temp_session;
    use reqwest::StatusCode;
    use std::sync::Arc;

    fn services(knowledge: Arc<MockKnowledge>, sources: Arc<MockSources>) -> Services {
        let (_dir, session) = temp_session();
        Services {
            auth: Arc::new(MockAuth::new(Arc::new(session))),
            knowledge,
            sources,
        }
    }

    #[tokio::test]
    async fn loads_recent_items_and_totals() {
        let items = (1..=8).map(|i| sample_item(&format!("k{i}"), "Item")).collect();
        let knowledge = Arc::new(MockKnowledge::with_items(items));
        let sources = Arc::new(MockSources::with_sources(vec![
            sample_source("s1", SourceKind::Github),
            sample_source("s2", SourceKind::Jira),
        ]));
        let services = services(knowledge.clone(), sources.clone());

        let mut dashboard = Dashboard::new(5);
        let fetch = dashboard.begin_load();
        assert!(dashboard.state.is_loading());
        let result = fetch.run(&services).await;
        dashboard.finish_load(fetch.seq, result);

        assert_eq!(dashboard.recent.len(), 5);
        assert_eq!(dashboard.total_knowledge, 8);
        assert_eq!(dashboard.total_sources, Some(2));
        assert_eq!(knowledge.calls(), vec!["list 0 5"]);
        assert_eq!(dashboard.open_selected(), Some(Route::KnowledgeView("k1".into())));
    }

    #[tokio::test]
    async fn failure_is_reported() {
        let knowledge = Arc::new(MockKnowledge::default());
        knowledge.fail_with(StatusCode::INTERNAL_SERVER_ERROR, None);
        let services = services(knowledge, Arc::new(MockSources::default()));

        let mut dashboard = Dashboard::new(5);
        let fetch = dashboard.begin_load();
        let result = fetch.run(&services).await;
        dashboard.finish_load(fetch.seq, result);
        assert_eq!(dashboard.state.error(), Some(LOAD_FAILED));
    }

    #[tokio::test]
    async fn failed_source_count_keeps_recent_items() {
        let items = (1..=3).map(|i| sample_item(&format!("k{i}"), "Item")).collect();
        let knowledge = Arc::new(MockKnowledge::with_items(items));
        let sources = Arc::new(MockSources::default());
        sources.fail_with(StatusCode::FORBIDDEN, None);
        let services = services(knowledge, sources);

        let mut dashboard = Dashboard::new(5);
        let fetch = dashboard.begin_load();
        let result = fetch.run(&services).await;
        dashboard.finish_load(fetch.seq, result);

        assert_eq!(dashboard.state, LoadState::Loaded);
        assert_eq!(dashboard.recent.len(), 3);
        assert_eq!(dashboard.total_knowledge, 3);
        assert_eq!(dashboard.total_sources, None);
    }

    #[test]
    fn quick_actions_map_to_routes() {
        assert_eq!(Dashboard::quick_action(1), Some(Route::KnowledgeCreate));
        assert_eq!(Dashboard::quick_action(3), Some(Route::knowledge()));
        assert_eq!(Dashboard::quick_action(4), None);
    }
}
