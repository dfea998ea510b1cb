use crate::api::ApiError;
use crate::model::knowledge::KnowledgeItem;
use crate::routes::Route;

use super::LoadState;

const LOAD_FAILED: &str = "Failed to load knowledge item";
const DELETE_FAILED: &str = "Failed to delete knowledge item";

pub struct KnowledgeDetail {
    pub id: String,
    pub item: Option<KnowledgeItem>,
    pub state: LoadState,
    pub confirm_delete: bool,
    pub deleting: bool,
    pub action_error: Option<String>,
    pub tag_cursor: Option<usize>,
    pub scroll: u16,
}

impl KnowledgeDetail {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item: None,
            state: LoadState::Idle,
            confirm_delete: false,
            deleting: false,
            action_error: None,
            tag_cursor: None,
            scroll: 0,
        }
    }

    pub fn begin_load(&mut self) -> String {
        self.state = LoadState::Loading;
        self.id.clone()
    }

    pub fn finish_load(&mut self, result: Result<KnowledgeItem, ApiError>) {
        match result {
            Ok(item) => {
                self.item = Some(item);
                self.state = LoadState::Loaded;
            }
            Err(e) => {
                self.item = None;
                self.state = LoadState::Failed(e.user_message(LOAD_FAILED));
            }
        }
    }

    pub fn edit_route(&self) -> Option<Route> {
        self.item
            .as_ref()
            .map(|item| Route::KnowledgeEdit(item.id.clone()))
    }

    /// Steps through the item's tags; wraps to "none selected" after the last.
    pub fn cycle_tag(&mut self) {
        let count = self.item.as_ref().map_or(0, |i| i.tags.len());
        self.tag_cursor = match self.tag_cursor {
            _ if count == 0 => None,
            None => Some(0),
            Some(i) if i + 1 < count => Some(i + 1),
            Some(_) => None,
        };
    }

    pub fn selected_tag(&self) -> Option<&str> {
        let item = self.item.as_ref()?;
        item.tags.get(self.tag_cursor?).map(String::as_str)
    }

    pub fn tag_route(&self) -> Option<Route> {
        self.selected_tag().map(|tag| Route::KnowledgeList {
            tag: Some(tag.to_string()),
        })
    }

    pub fn request_delete(&mut self) {
        if self.item.is_some() && !self.deleting {
            self.confirm_delete = true;
        }
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = false;
    }

    pub fn begin_delete(&mut self) -> Option<String> {
        if !self.confirm_delete || self.deleting {
            return None;
        }
        self.confirm_delete = false;
        self.deleting = true;
        self.action_error = None;
        Some(self.id.clone())
    }

    pub fn finish_delete(&mut self, result: Result<(), ApiError>) -> Option<Route> {
        self.deleting = false;
        match result {
            Ok(()) => Some(Route::knowledge()),
            Err(e) => {
                self.action_error = Some(e.user_message(DELETE_FAILED));
                None
            }
        }
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::knowledge::sample_item;
    use crate::services::tests::MockKnowledge;
    use crate::services::KnowledgeService;

    #[tokio::test]
    async fn missing_item_renders_error_state() {
        let svc = MockKnowledge::default();
        let mut detail = KnowledgeDetail::new("nope");
        let id = detail.begin_load();
        detail.finish_load(svc.get(&id).await);
        assert!(detail.item.is_none());
        assert_eq!(detail.state.error(), Some("Knowledge item not found"));
        assert_eq!(detail.edit_route(), None);
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let svc = MockKnowledge::with_items(vec![sample_item("k1", "Doomed")]);
        let mut detail = KnowledgeDetail::new("k1");
        let id = detail.begin_load();
        detail.finish_load(svc.get(&id).await);

        assert!(detail.begin_delete().is_none());
        detail.request_delete();
        let id = detail.begin_delete().unwrap();
        assert!(detail.begin_delete().is_none());
        let route = detail.finish_delete(svc.delete(&id).await);

        assert_eq!(route, Some(Route::knowledge()));
        assert_eq!(svc.calls(), vec!["get k1", "delete k1"]);
    }

    #[test]
    fn tag_cycle_opens_filtered_list() {
        let mut item = sample_item("k1", "Tagged");
        item.tags = vec!["rust".into(), "async".into()];
        let mut detail = KnowledgeDetail::new("k1");
        detail.finish_load(Ok(item));

        assert_eq!(detail.tag_route(), None);
        detail.cycle_tag();
        detail.cycle_tag();
        assert_eq!(
            detail.tag_route(),
            Some(Route::KnowledgeList {
                tag: Some("async".into())
            })
        );
        detail.cycle_tag();
        assert_eq!(detail.selected_tag(), None);
    }
}
