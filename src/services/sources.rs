use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{page_query, SourcesService};
use crate::api::{ApiClient, ApiError};
use crate::model::page::{Page, PageRequest};
use crate::model::source::{
    ConnectionTest, CreateSourceRequest, KnowledgeSource, UpdateSourceRequest,
};

pub struct HttpSourcesService {
    client: Arc<ApiClient>,
}

impl HttpSourcesService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

fn source_path(id: &str) -> String {
    format!("/knowledge-sources/{}", urlencoding::encode(id))
}

#[async_trait]
impl SourcesService for HttpSourcesService {
    async fn list(&self, page: PageRequest) -> Result<Page<KnowledgeSource>, ApiError> {
        self.client.get("/knowledge-sources", &page_query(page)).await
    }

    async fn get(&self, id: &str) -> Result<KnowledgeSource, ApiError> {
        self.client.get(&source_path(id), &[]).await
    }

    async fn create(&self, request: &CreateSourceRequest) -> Result<KnowledgeSource, ApiError> {
        self.client.post("/knowledge-sources", request).await
    }

    async fn update(
        &self,
        id: &str,
        request: &UpdateSourceRequest,
    ) -> Result<KnowledgeSource, ApiError> {
        self.client.put(&source_path(id), request).await
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&source_path(id)).await
    }

    async fn sync(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .post_unit(&format!("{}/sync", source_path(id)), &json!({}))
            .await
    }

    async fn test_connection(
        &self,
        request: &CreateSourceRequest,
    ) -> Result<ConnectionTest, ApiError> {
        self.client.post("/knowledge-sources/test", request).await
    }
}
