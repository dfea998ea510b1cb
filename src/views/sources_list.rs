use crate::api::ApiError;
use crate::model::page::{Page, PageRequest};
use crate::model::source::KnowledgeSource;
use crate::routes::Route;

use super::{step, LoadState, RequestSeq};

const LOAD_FAILED: &str = "Failed to load knowledge sources";
const SYNC_FAILED: &str = "Failed to sync source";
const DELETE_FAILED: &str = "Failed to delete source";

pub struct SourcesList {
    pub sources: Vec<KnowledgeSource>,
    pub total: u64,
    pub state: LoadState,
    pub selected: usize,
    /// Source whose sync is in flight.
    pub syncing_id: Option<String>,
    /// Source awaiting delete confirmation.
    pub pending_delete: Option<KnowledgeSource>,
    pub deleting: bool,
    pub action_error: Option<String>,
    size: u32,
    seq: RequestSeq,
}

impl SourcesList {
    pub fn new(size: u32) -> Self {
        Self {
            sources: Vec::new(),
            total: 0,
            state: LoadState::Idle,
            selected: 0,
            syncing_id: None,
            pending_delete: None,
            deleting: false,
            action_error: None,
            size,
            seq: RequestSeq::default(),
        }
    }

    pub fn begin_load(&mut self) -> (u64, PageRequest) {
        self.state = LoadState::Loading;
        (self.seq.next(), PageRequest::new(0, self.size))
    }

    pub fn finish_load(&mut self, seq: u64, result: Result<Page<KnowledgeSource>, ApiError>) {
        if !self.seq.is_current(seq) {
            return;
        }
        match result {
            Ok(page) => {
                self.total = page.total_elements;
                self.sources = page.content;
                self.selected = step(self.selected, self.sources.len(), 0);
                self.state = LoadState::Loaded;
            }
            Err(e) => self.state = LoadState::Failed(e.user_message(LOAD_FAILED)),
        }
    }

    pub fn selected_source(&self) -> Option<&KnowledgeSource> {
        self.sources.get(self.selected)
    }

    pub fn select_next(&mut self) {
        self.selected = step(self.selected, self.sources.len(), 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = step(self.selected, self.sources.len(), -1);
    }

    pub fn open_selected(&self) -> Option<Route> {
        self.selected_source()
            .map(|s| Route::SourceView(s.id.clone()))
    }

    pub fn edit_selected(&self) -> Option<Route> {
        self.selected_source()
            .map(|s| Route::SourceEdit(s.id.clone()))
    }

    /// Starts syncing the selected source; only one sync runs at a time.
    pub fn begin_sync(&mut self) -> Option<String> {
        if self.syncing_id.is_some() {
            return None;
        }
        let id = self.selected_source()?.id.clone();
        self.syncing_id = Some(id.clone());
        self.action_error = None;
        Some(id)
    }

    /// On success the caller refetches the list to pick up the new last sync.
    pub fn finish_sync(&mut self, result: Result<(), ApiError>) -> bool {
        self.syncing_id = None;
        match result {
            Ok(()) => true,
            Err(e) => {
                self.action_error = Some(e.user_message(SYNC_FAILED));
                false
            }
        }
    }

    pub fn request_delete(&mut self) {
        if !self.deleting {
            self.pending_delete = self.selected_source().cloned();
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn begin_delete(&mut self) -> Option<String> {
        if self.deleting {
            return None;
        }
        let id = self.pending_delete.as_ref()?.id.clone();
        self.deleting = true;
        self.action_error = None;
        Some(id)
    }

    /// Drops the deleted source from the local list without refetching.
    pub fn finish_delete(&mut self, id: &str, result: Result<(), ApiError>) {
        self.deleting = false;
        match result {
            Ok(()) => {
                self.sources.retain(|s| s.id != id);
                self.total = self.total.saturating_sub(1);
                self.pending_delete = None;
                self.selected = step(self.selected, self.sources.len(), 0);
            }
            Err(e) => self.action_error = Some(e.user_message(DELETE_FAILED)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::source::{sample_source, SourceKind};
    use crate::services::tests::MockSources;
    use crate::services::SourcesService;
    use reqwest::StatusCode;

    async fn loaded(svc: &MockSources) -> SourcesList {
        let mut list = SourcesList::new(20);
        let (seq, page) = list.begin_load();
        list.finish_load(seq, svc.list(page).await);
        list
    }

    fn three() -> MockSources {
        MockSources::with_sources(vec![
            sample_source("s1", SourceKind::Github),
            sample_source("s2", SourceKind::Jira),
            sample_source("s3", SourceKind::Gitlab),
        ])
    }

    #[tokio::test]
    async fn delete_removes_locally_without_refetch() {
        let svc = three();
        let mut list = loaded(&svc).await;
        list.select_next();

        list.request_delete();
        let id = list.begin_delete().unwrap();
        assert_eq!(id, "s2");
        list.finish_delete(&id, svc.delete(&id).await);

        let ids: Vec<&str> = list.sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s3"]);
        assert_eq!(list.pending_delete, None);
        assert_eq!(svc.calls(), vec!["list 0 20", "delete s2"]);
    }

    #[tokio::test]
    async fn failed_delete_keeps_source() {
        let svc = three();
        let mut list = loaded(&svc).await;
        svc.fail_with(StatusCode::FORBIDDEN, Some("Not allowed"));

        list.request_delete();
        let id = list.begin_delete().unwrap();
        list.finish_delete(&id, svc.delete(&id).await);
        assert_eq!(list.sources.len(), 3);
        assert_eq!(list.action_error.as_deref(), Some("Not allowed"));
    }

    #[tokio::test]
    async fn sync_blocks_duplicates_then_refetches() {
        let svc = three();
        let mut list = loaded(&svc).await;

        let id = list.begin_sync().unwrap();
        assert!(list.begin_sync().is_none());
        assert!(list.finish_sync(svc.sync(&id).await));
        assert_eq!(list.syncing_id, None);

        let (seq, page) = list.begin_load();
        list.finish_load(seq, svc.list(page).await);
        assert!(list.sources[0].last_sync.is_some());
    }

    #[test]
    fn delete_needs_pending_source() {
        let mut list = SourcesList::new(20);
        list.request_delete();
        assert!(list.begin_delete().is_none());
    }
}
