//! HTTP client adapter for the knowledge-base API.
//!
//! Every request goes through [`ApiClient`], which prefixes the configured
//! base URL, attaches the session's bearer token, and turns non-2xx responses
//! into [`ApiError::Status`] carrying the server's `message` when it sent one.

use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::Session;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{status}: {}", message.as_deref().unwrap_or("no message"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Session storage failed: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    /// The server's message if it sent one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ApiError::NoRefreshToken => self.to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

pub struct ApiClient {
    base_url: String,
    client: Client,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Arc<Session>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            session,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(token) = self.session.access_token() {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(&self, method: Method, path: &str, req: RequestBuilder) -> Result<Response, ApiError> {
        tracing::debug!(%method, path, "API request");
        let response = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%method, path, "API request failed: {e}");
                return Err(ApiError::Transport(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        tracing::warn!(%method, path, %status, message = message.as_deref().unwrap_or(""), "API error");
        Err(ApiError::Status { status, message })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let req = self.request(Method::GET, path).query(query);
        let response = self.send(Method::GET, path, req).await?;
        Self::decode(response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(Method::POST, path).json(body);
        let response = self.send(Method::POST, path, req).await?;
        Self::decode(response).await
    }

    /// POST whose response body is ignored.
    pub async fn post_unit<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let req = self.request(Method::POST, path).json(body);
        self.send(Method::POST, path, req).await?;
        Ok(())
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(Method::PUT, path).json(body);
        let response = self.send(Method::PUT, path, req).await?;
        Self::decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let req = self.request(Method::DELETE, path);
        self.send(Method::DELETE, path, req).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_text() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: Some("Title is required".into()),
        };
        assert_eq!(err.user_message("Failed"), "Title is required");
    }

    #[test]
    fn user_message_falls_back() {
        let blank = ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: Some("  ".into()),
        };
        assert_eq!(blank.user_message("Failed to load"), "Failed to load");

        let none = ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: None,
        };
        assert_eq!(none.user_message("Failed to load"), "Failed to load");
        assert_eq!(none.to_string(), "502 Bad Gateway: no message");
    }

    #[test]
    fn unauthorized_detection() {
        let err = ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: None,
        };
        assert!(err.is_unauthorized());
        assert!(!ApiError::NoRefreshToken.is_unauthorized());
    }
}
