use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{AuthService, LoginRequest, LoginResponse, RefreshResponse, RegisterRequest};
use crate::api::{ApiClient, ApiError};
use crate::model::user::User;

pub struct HttpAuthService {
    client: Arc<ApiClient>,
}

impl HttpAuthService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let response: LoginResponse = self.client.post("/auth/login", credentials).await?;
        self.client.session().establish(
            &response.access_token,
            &response.refresh_token,
            &response.user,
        )?;
        Ok(response)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        self.client.post("/auth/register", request).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.client.session().clear()?;
        Ok(())
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.client.get("/auth/me", &[]).await
    }

    async fn refresh(&self) -> Result<RefreshResponse, ApiError> {
        let session = self.client.session();
        let refresh_token = session.refresh_token().ok_or(ApiError::NoRefreshToken)?;
        let response: RefreshResponse = self
            .client
            .post("/auth/refresh", &json!({ "refreshToken": refresh_token }))
            .await?;
        session.refreshed(&response.access_token, &response.user)?;
        Ok(response)
    }
}
