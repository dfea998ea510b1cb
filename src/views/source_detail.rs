use crate::api::ApiError;
use crate::model::source::KnowledgeSource;
use crate::routes::Route;
use crate::services::SourcesService;

use super::LoadState;

const LOAD_FAILED: &str = "Failed to load knowledge source";
const SYNC_FAILED: &str = "Failed to sync source";

pub struct SourceDetail {
    pub id: String,
    pub source: Option<KnowledgeSource>,
    pub state: LoadState,
    pub syncing: bool,
    pub action_error: Option<String>,
}

/// Sync followed by a fetch so the new last-sync time shows up.
pub async fn sync_and_reload(
    sources: &dyn SourcesService,
    id: &str,
) -> Result<KnowledgeSource, ApiError> {
    sources.sync(id).await?;
    sources.get(id).await
}

impl SourceDetail {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: None,
            state: LoadState::Idle,
            syncing: false,
            action_error: None,
        }
    }

    pub fn begin_load(&mut self) -> String {
        self.state = LoadState::Loading;
        self.id.clone()
    }

    pub fn finish_load(&mut self, result: Result<KnowledgeSource, ApiError>) {
        match result {
            Ok(source) => {
                self.source = Some(source);
                self.state = LoadState::Loaded;
            }
            Err(e) => {
                self.source = None;
                self.state = LoadState::Failed(e.user_message(LOAD_FAILED));
            }
        }
    }

    pub fn edit_route(&self) -> Option<Route> {
        self.source
            .as_ref()
            .map(|s| Route::SourceEdit(s.id.clone()))
    }

    pub fn begin_sync(&mut self) -> Option<String> {
        if self.syncing || self.source.is_none() {
            return None;
        }
        self.syncing = true;
        self.action_error = None;
        Some(self.id.clone())
    }

    pub fn finish_sync(&mut self, result: Result<KnowledgeSource, ApiError>) {
        self.syncing = false;
        match result {
            Ok(source) => self.source = Some(source),
            Err(e) => self.action_error = Some(e.user_message(SYNC_FAILED)),
        }
    }
}
