use std::sync::Arc;

use async_trait::async_trait;

use super::{page_query, KnowledgeService};
use crate::api::{ApiClient, ApiError};
use crate::model::knowledge::{KnowledgeInput, KnowledgeItem};
use crate::model::page::{Page, PageRequest};
use crate::model::search::{SearchRequest, SearchResponse};

pub struct HttpKnowledgeService {
    client: Arc<ApiClient>,
}

impl HttpKnowledgeService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KnowledgeService for HttpKnowledgeService {
    async fn list(&self, page: PageRequest) -> Result<Page<KnowledgeItem>, ApiError> {
        self.client.get("/knowledge", &page_query(page)).await
    }

    async fn get(&self, id: &str) -> Result<KnowledgeItem, ApiError> {
        self.client
            .get(&format!("/knowledge/{}", urlencoding::encode(id)), &[])
            .await
    }

    async fn create(&self, input: &KnowledgeInput) -> Result<KnowledgeItem, ApiError> {
        self.client.post("/knowledge", input).await
    }

    async fn update(&self, id: &str, input: &KnowledgeInput) -> Result<KnowledgeItem, ApiError> {
        self.client
            .put(&format!("/knowledge/{}", urlencoding::encode(id)), input)
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/knowledge/{}", urlencoding::encode(id)))
            .await
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        self.client.post("/knowledge/search", request).await
    }

    async fn by_tag(&self, tag: &str, page: PageRequest) -> Result<Page<KnowledgeItem>, ApiError> {
        let path = format!("/knowledge/tags/{}", urlencoding::encode(tag));
        self.client.get(&path, &page_query(page)).await
    }
}
