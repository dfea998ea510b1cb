use serde_json::{Map, Value};

use crate::api::ApiError;
use crate::model::knowledge::{KnowledgeInput, KnowledgeItem, SourceType};
use crate::routes::Route;
use crate::services::KnowledgeService;

use super::input::TextInput;
use super::{cycle, LoadState};

const CREATE_FAILED: &str = "Failed to create knowledge item";
const UPDATE_FAILED: &str = "Failed to update knowledge item";
const LOAD_FAILED: &str = "Failed to load knowledge item";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnowledgeField {
    Title,
    Summary,
    Content,
    SourceUrl,
    Tags,
}

impl KnowledgeField {
    pub const ALL: [KnowledgeField; 5] = [
        KnowledgeField::Title,
        KnowledgeField::Summary,
        KnowledgeField::Content,
        KnowledgeField::SourceUrl,
        KnowledgeField::Tags,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            KnowledgeField::Title => "Title *",
            KnowledgeField::Summary => "Summary",
            KnowledgeField::Content => "Content *",
            KnowledgeField::SourceUrl => "Source URL",
            KnowledgeField::Tags => "Add Tags",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

pub struct KnowledgeSubmit {
    pub mode: FormMode,
    pub input: KnowledgeInput,
}

impl KnowledgeSubmit {
    pub async fn run(&self, knowledge: &dyn KnowledgeService) -> Result<KnowledgeItem, ApiError> {
        match &self.mode {
            FormMode::Create => knowledge.create(&self.input).await,
            FormMode::Edit(id) => knowledge.update(id, &self.input).await,
        }
    }
}

pub struct KnowledgeForm {
    pub mode: FormMode,
    inputs: [TextInput; 5],
    pub tags: Vec<String>,
    pub tag_cursor: Option<usize>,
    pub source_type: SourceType,
    metadata: Map<String, Value>,
    focus: usize,
    pub state: LoadState,
    pub submitting: bool,
    pub error: Option<String>,
}

impl KnowledgeForm {
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            inputs: Default::default(),
            tags: Vec::new(),
            tag_cursor: None,
            source_type: SourceType::Manual,
            metadata: Map::new(),
            focus: 0,
            state: LoadState::Loaded,
            submitting: false,
            error: None,
        }
    }

    pub fn edit(id: impl Into<String>) -> Self {
        Self {
            mode: FormMode::Edit(id.into()),
            state: LoadState::Idle,
            ..Self::create()
        }
    }

    pub fn route(&self) -> Route {
        match &self.mode {
            FormMode::Create => Route::KnowledgeCreate,
            FormMode::Edit(id) => Route::KnowledgeEdit(id.clone()),
        }
    }

    /// Edit mode fetches the item before the draft can be submitted.
    pub fn begin_load(&mut self) -> Option<String> {
        match &self.mode {
            FormMode::Create => None,
            FormMode::Edit(id) => {
                self.state = LoadState::Loading;
                Some(id.clone())
            }
        }
    }

    pub fn finish_load(&mut self, result: Result<KnowledgeItem, ApiError>) {
        match result {
            Ok(item) => {
                self.inputs[KnowledgeField::Title as usize].set(item.title);
                self.inputs[KnowledgeField::Summary as usize].set(item.summary.unwrap_or_default());
                self.inputs[KnowledgeField::Content as usize].set(item.content);
                self.inputs[KnowledgeField::SourceUrl as usize]
                    .set(item.source_url.unwrap_or_default());
                self.tags = item.tags;
                self.source_type = item.source_type;
                self.metadata = item.metadata.to_wire();
                self.state = LoadState::Loaded;
            }
            Err(e) => self.state = LoadState::Failed(e.user_message(LOAD_FAILED)),
        }
    }

    pub fn focus(&self) -> KnowledgeField {
        KnowledgeField::ALL[self.focus]
    }

    pub fn next_field(&mut self) {
        self.focus = cycle(self.focus, KnowledgeField::ALL.len(), true);
    }

    pub fn prev_field(&mut self) {
        self.focus = cycle(self.focus, KnowledgeField::ALL.len(), false);
    }

    pub fn input(&self, field: KnowledgeField) -> &TextInput {
        &self.inputs[field as usize]
    }

    pub fn field_mut(&mut self, field: KnowledgeField) -> &mut TextInput {
        self.error = None;
        &mut self.inputs[field as usize]
    }

    pub fn input_mut(&mut self) -> &mut TextInput {
        self.field_mut(self.focus())
    }

    /// Moves the tag input into the tag list. Blank and duplicate tags are
    /// rejected and stay in the input.
    pub fn add_tag(&mut self) -> bool {
        let tag = self.input(KnowledgeField::Tags).trimmed().to_string();
        if tag.is_empty() || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        self.field_mut(KnowledgeField::Tags).clear();
        true
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
        self.tag_cursor = match self.tag_cursor {
            Some(_) if self.tags.is_empty() => None,
            Some(i) => Some(i.min(self.tags.len() - 1)),
            None => None,
        };
    }

    pub fn cycle_tag(&mut self) {
        self.tag_cursor = match self.tag_cursor {
            _ if self.tags.is_empty() => None,
            None => Some(0),
            Some(i) if i + 1 < self.tags.len() => Some(i + 1),
            Some(_) => None,
        };
    }

    /// Removes the tag under the cursor, if any.
    pub fn remove_selected_tag(&mut self) {
        if let Some(tag) = self.tag_cursor.and_then(|i| self.tags.get(i)).cloned() {
            self.remove_tag(&tag);
        }
    }

    pub fn can_submit(&self) -> bool {
        self.state == LoadState::Loaded
            && !self.submitting
            && !self.input(KnowledgeField::Title).is_blank()
            && !self.input(KnowledgeField::Content).is_blank()
    }

    fn optional(&self, field: KnowledgeField) -> Option<String> {
        let value = self.input(field).trimmed();
        (!value.is_empty()).then(|| value.to_string())
    }

    pub fn begin_submit(&mut self) -> Option<KnowledgeSubmit> {
        if !self.can_submit() {
            return None;
        }
        self.submitting = true;
        self.error = None;
        Some(KnowledgeSubmit {
            mode: self.mode.clone(),
            input: KnowledgeInput {
                title: self.input(KnowledgeField::Title).trimmed().to_string(),
                content: self.input(KnowledgeField::Content).value().to_string(),
                summary: self.optional(KnowledgeField::Summary),
                source_type: self.source_type,
                source_url: self.optional(KnowledgeField::SourceUrl),
                tags: self.tags.clone(),
                metadata: self.metadata.clone(),
            },
        })
    }

    pub fn finish_submit(&mut self, result: Result<KnowledgeItem, ApiError>) -> Option<Route> {
        self.submitting = false;
        match result {
            Ok(item) => Some(Route::KnowledgeView(item.id)),
            Err(e) => {
                let fallback = match self.mode {
                    FormMode::Create => CREATE_FAILED,
                    FormMode::Edit(_) => UPDATE_FAILED,
                };
                self.error = Some(e.user_message(fallback));
                None
            }
        }
    }
}
