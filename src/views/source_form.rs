use crate::api::ApiError;
use crate::model::source::{
    ConfigField, ConnectionTest, CreateSourceRequest, KnowledgeSource, SourceConfig, SourceKind,
    UpdateSourceRequest,
};
use crate::routes::Route;
use crate::services::SourcesService;

use super::input::TextInput;
use super::{cycle, LoadState};

const CREATE_FAILED: &str = "Failed to create knowledge source";
const UPDATE_FAILED: &str = "Failed to update knowledge source";
const LOAD_FAILED: &str = "Failed to load knowledge source";
const TEST_OK: &str = "Connection test successful!";
const TEST_FAILED: &str = "Connection test failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFocus {
    Kind,
    Field(usize),
    Active,
}

pub enum SourceSubmit {
    Create(CreateSourceRequest),
    Update(String, UpdateSourceRequest),
}

impl SourceSubmit {
    pub async fn run(&self, sources: &dyn SourcesService) -> Result<KnowledgeSource, ApiError> {
        match self {
            SourceSubmit::Create(request) => sources.create(request).await,
            SourceSubmit::Update(id, request) => sources.update(id, request).await,
        }
    }
}

pub struct SourceForm {
    /// `Some(id)` when editing an existing source; its kind is then fixed.
    pub editing: Option<String>,
    base: SourceConfig,
    inputs: Vec<TextInput>,
    pub is_active: bool,
    focus: usize,
    pub state: LoadState,
    pub submitting: bool,
    pub testing: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl SourceForm {
    pub fn create() -> Self {
        Self::blank(None, SourceKind::Github, LoadState::Loaded)
    }

    pub fn edit(id: impl Into<String>) -> Self {
        Self::blank(Some(id.into()), SourceKind::Github, LoadState::Idle)
    }

    fn blank(editing: Option<String>, kind: SourceKind, state: LoadState) -> Self {
        let base = SourceConfig::empty(kind);
        Self {
            editing,
            inputs: vec![TextInput::new(); base.fields().len()],
            base,
            is_active: true,
            focus: 0,
            state,
            submitting: false,
            testing: false,
            error: None,
            success: None,
        }
    }

    pub fn route(&self) -> Route {
        match &self.editing {
            Some(id) => Route::SourceEdit(id.clone()),
            None => Route::SourceCreate,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.base.kind()
    }

    pub fn fields(&self) -> &'static [ConfigField] {
        self.base.fields()
    }

    pub fn input(&self, index: usize) -> Option<&TextInput> {
        self.inputs.get(index)
    }

    /// The draft configuration: typed fields from the inputs, unknown keys
    /// carried over from the loaded source.
    pub fn config(&self) -> SourceConfig {
        let mut config = self.base.clone();
        for (field, input) in self.fields().iter().zip(&self.inputs) {
            config.set(field.key, input.value().trim());
        }
        config
    }

    pub fn begin_load(&mut self) -> Option<String> {
        let id = self.editing.clone()?;
        self.state = LoadState::Loading;
        Some(id)
    }

    pub fn finish_load(&mut self, result: Result<KnowledgeSource, ApiError>) {
        match result {
            Ok(source) => {
                self.inputs = source
                    .config
                    .fields()
                    .iter()
                    .map(|f| TextInput::with_value(source.config.get(f.key)))
                    .collect();
                self.base = source.config;
                self.is_active = source.is_active;
                self.focus = 0;
                self.state = LoadState::Loaded;
            }
            Err(e) => self.state = LoadState::Failed(e.user_message(LOAD_FAILED)),
        }
    }

    pub fn focus_order(&self) -> Vec<SourceFocus> {
        let kind = self.editing.is_none().then_some(SourceFocus::Kind);
        kind.into_iter()
            .chain((0..self.inputs.len()).map(SourceFocus::Field))
            .chain(std::iter::once(SourceFocus::Active))
            .collect()
    }

    pub fn focus(&self) -> SourceFocus {
        let order = self.focus_order();
        order[self.focus.min(order.len() - 1)]
    }

    pub fn next_field(&mut self) {
        self.focus = cycle(self.focus, self.focus_order().len(), true);
    }

    pub fn prev_field(&mut self) {
        self.focus = cycle(self.focus, self.focus_order().len(), false);
    }

    fn clear_messages(&mut self) {
        self.error = None;
        self.success = None;
    }

    /// Switches the source type and discards every configuration value.
    pub fn set_kind(&mut self, kind: SourceKind) {
        if self.editing.is_some() {
            return;
        }
        let focus = self.focus;
        *self = Self::blank(None, kind, LoadState::Loaded);
        self.focus = focus;
    }

    pub fn cycle_kind(&mut self) {
        self.set_kind(self.kind().next());
    }

    pub fn toggle_active(&mut self) {
        self.is_active = !self.is_active;
        self.clear_messages();
    }

    /// The focused configuration input, if a field has focus.
    pub fn input_mut(&mut self) -> Option<&mut TextInput> {
        let SourceFocus::Field(index) = self.focus() else {
            return None;
        };
        self.clear_messages();
        self.inputs.get_mut(index)
    }

    #[cfg(test)]
    pub fn set_field(&mut self, key: &str, value: &str) {
        if let Some(index) = self.fields().iter().position(|f| f.key == key) {
            self.clear_messages();
            self.inputs[index].set(value);
        }
    }

    /// Required fields still blank, by label.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.config().missing_fields()
    }

    pub fn can_test(&self) -> bool {
        self.state == LoadState::Loaded && !self.testing && self.config().is_complete()
    }

    pub fn can_submit(&self) -> bool {
        self.state == LoadState::Loaded && !self.submitting && self.config().is_complete()
    }

    pub fn begin_test(&mut self) -> Option<CreateSourceRequest> {
        if !self.can_test() {
            return None;
        }
        self.testing = true;
        self.clear_messages();
        Some(CreateSourceRequest::new(&self.config(), self.is_active))
    }

    /// Reports the outcome; nothing is persisted by a test.
    pub fn finish_test(&mut self, result: Result<ConnectionTest, ApiError>) {
        self.testing = false;
        match result {
            Ok(test) if test.success => {
                self.success = Some(test.message.unwrap_or_else(|| TEST_OK.to_string()));
            }
            Ok(test) => {
                self.error = Some(test.message.unwrap_or_else(|| TEST_FAILED.to_string()));
            }
            Err(e) => self.error = Some(e.user_message(TEST_FAILED)),
        }
    }

    pub fn begin_submit(&mut self) -> Option<SourceSubmit> {
        if !self.can_submit() {
            return None;
        }
        self.submitting = true;
        self.clear_messages();
        let config = self.config();
        Some(match &self.editing {
            None => SourceSubmit::Create(CreateSourceRequest::new(&config, self.is_active)),
            Some(id) => SourceSubmit::Update(
                id.clone(),
                UpdateSourceRequest {
                    configuration: Some(config.to_wire()),
                    is_active: Some(self.is_active),
                },
            ),
        })
    }

    pub fn finish_submit(&mut self, result: Result<KnowledgeSource, ApiError>) -> Option<Route> {
        self.submitting = false;
        match result {
            Ok(source) => Some(Route::SourceView(source.id)),
            Err(e) => {
                let fallback = if self.editing.is_some() {
                    UPDATE_FAILED
                } else {
                    CREATE_FAILED
                };
                self.error = Some(e.user_message(fallback));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::source::sample_source;
    use crate::services::tests::MockSources;
    use serde_json::json;

    #[test]
    fn github_with_token_but_no_owner_is_blocked() {
        let mut form = SourceForm::create();
        form.set_field("token", "ghp_123");
        assert!(!form.can_test());
        assert!(!form.can_submit());
        assert!(form.begin_test().is_none());
        assert!(form.begin_submit().is_none());
        assert_eq!(form.missing_fields(), vec!["Repository Owner/Organization"]);

        form.set_field("owner", "octo-org");
        assert!(form.can_test() && form.can_submit());
    }

    #[test]
    fn switching_type_clears_configuration() {
        let mut form = SourceForm::create();
        form.set_field("token", "ghp_123");
        form.set_field("owner", "octo-org");
        form.error = Some("old".into());

        form.set_kind(SourceKind::Jira);
        assert_eq!(form.kind(), SourceKind::Jira);
        let wire = form.config().to_wire();
        assert!(wire.values().all(|v| v == ""), "leftover values: {wire:?}");
        assert!(!wire.contains_key("owner"));
        assert_eq!(form.error, None);

        form.set_kind(SourceKind::Github);
        assert_eq!(form.config().get("token"), "");
    }

    #[tokio::test]
    async fn connection_test_reports_without_persisting() {
        let svc = MockSources::default();
        let mut form = SourceForm::create();
        form.set_field("token", "t");
        form.set_field("owner", "o");

        let request = form.begin_test().unwrap();
        assert!(form.begin_test().is_none());
        form.finish_test(svc.test_connection(&request).await);
        assert_eq!(form.success.as_deref(), Some(TEST_OK));

        *svc.connection.lock().unwrap() = Some(ConnectionTest {
            success: false,
            message: Some("Bad credentials".into()),
        });
        let request = form.begin_test().unwrap();
        form.finish_test(svc.test_connection(&request).await);
        assert_eq!(form.error.as_deref(), Some("Bad credentials"));
        assert_eq!(form.success, None);

        assert!(svc.sources.lock().unwrap().is_empty());
        assert_eq!(svc.calls(), vec!["test GITHUB", "test GITHUB"]);
    }

    #[tokio::test]
    async fn create_navigates_to_new_source() {
        let svc = MockSources::default();
        let mut form = SourceForm::create();
        form.cycle_kind();
        assert_eq!(form.kind(), SourceKind::Jira);
        for (key, value) in [
            ("url", "https://acme.atlassian.net"),
            ("username", "ops@acme.io"),
            ("token", "tok"),
            ("projectKey", "OPS"),
        ] {
            form.set_field(key, value);
        }
        form.toggle_active();

        let submit = form.begin_submit().unwrap();
        let SourceSubmit::Create(request) = &submit else {
            panic!("expected create");
        };
        assert_eq!(request.is_active, Some(false));
        assert_eq!(request.configuration["projectKey"], json!("OPS"));

        let route = form.finish_submit(submit.run(&svc).await);
        assert_eq!(route, Some(Route::SourceView("s1".into())));
    }

    #[tokio::test]
    async fn edit_keeps_type_and_unknown_keys() {
        let mut source = sample_source("s4", SourceKind::Gitlab);
        source.config.set("webhookSecret", "keep-me");
        let svc = MockSources::with_sources(vec![source]);

        let mut form = SourceForm::edit("s4");
        assert!(!form.can_submit());
        let id = form.begin_load().unwrap();
        form.finish_load(svc.get(&id).await);
        assert_eq!(form.focus_order()[0], SourceFocus::Field(0));

        form.cycle_kind();
        assert_eq!(form.kind(), SourceKind::Gitlab, "type is fixed when editing");

        form.set_field("projectId", "42");
        let submit = form.begin_submit().unwrap();
        let SourceSubmit::Update(id, request) = &submit else {
            panic!("expected update");
        };
        assert_eq!(id, "s4");
        let configuration = request.configuration.as_ref().unwrap();
        assert_eq!(configuration["projectId"], json!("42"));
        assert_eq!(configuration["webhookSecret"], json!("keep-me"));

        let route = form.finish_submit(submit.run(&svc).await);
        assert_eq!(route, Some(Route::SourceView("s4".into())));
        assert_eq!(
            svc.sources.lock().unwrap()[0].config.get("projectId"),
            "42"
        );
    }
}
