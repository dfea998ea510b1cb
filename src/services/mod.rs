pub mod auth;
pub mod knowledge;
pub mod sources;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiError};
use crate::model::knowledge::{KnowledgeInput, KnowledgeItem};
use crate::model::page::{Page, PageRequest};
use crate::model::search::{SearchRequest, SearchResponse};
use crate::model::source::{
    ConnectionTest, CreateSourceRequest, KnowledgeSource, UpdateSourceRequest,
};
use crate::model::user::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub user: User,
}

/// Authentication calls. Login, refresh and logout also update the session.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError>;
    async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
    async fn current_user(&self) -> Result<User, ApiError>;
    async fn refresh(&self) -> Result<RefreshResponse, ApiError>;
}

#[async_trait]
pub trait KnowledgeService: Send + Sync {
    async fn list(&self, page: PageRequest) -> Result<Page<KnowledgeItem>, ApiError>;
    async fn get(&self, id: &str) -> Result<KnowledgeItem, ApiError>;
    async fn create(&self, input: &KnowledgeInput) -> Result<KnowledgeItem, ApiError>;
    async fn update(&self, id: &str, input: &KnowledgeInput) -> Result<KnowledgeItem, ApiError>;
    async fn delete(&self, id: &str) -> Result<(), ApiError>;
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError>;
    async fn by_tag(&self, tag: &str, page: PageRequest) -> Result<Page<KnowledgeItem>, ApiError>;
}

#[async_trait]
pub trait SourcesService: Send + Sync {
    async fn list(&self, page: PageRequest) -> Result<Page<KnowledgeSource>, ApiError>;
    async fn get(&self, id: &str) -> Result<KnowledgeSource, ApiError>;
    async fn create(&self, request: &CreateSourceRequest) -> Result<KnowledgeSource, ApiError>;
    async fn update(
        &self,
        id: &str,
        request: &UpdateSourceRequest,
    ) -> Result<KnowledgeSource, ApiError>;
    async fn delete(&self, id: &str) -> Result<(), ApiError>;
    async fn sync(&self, id: &str) -> Result<(), ApiError>;
    async fn test_connection(&self, request: &CreateSourceRequest)
        -> Result<ConnectionTest, ApiError>;
}

/// The three service façades handed to screens and CLI commands.
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<dyn AuthService>,
    pub knowledge: Arc<dyn KnowledgeService>,
    pub sources: Arc<dyn SourcesService>,
}

impl Services {
    pub fn http(client: ApiClient) -> Self {
        let client = Arc::new(client);
        Self {
            auth: Arc::new(auth::HttpAuthService::new(client.clone())),
            knowledge: Arc::new(knowledge::HttpKnowledgeService::new(client.clone())),
            sources: Arc::new(sources::HttpSourcesService::new(client)),
        }
    }
}

fn page_query(page: PageRequest) -> [(&'static str, String); 2] {
    [("page", page.page.to_string()), ("size", page.size.to_string())]
}

#[cfg(test)]
pub mod tests;
