use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode as AxumStatus};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::StatusCode;
use serde_json::{json, Value};

use super::*;
use crate::model::knowledge::sample_item;
use crate::model::search::SearchResult;
use crate::model::source::SourceConfig;
use crate::model::timestamp::Timestamp;
use crate::model::user::sample_user;
use crate::session::{temp_session, Session};

pub fn status_error(status: StatusCode, message: Option<&str>) -> ApiError {
    ApiError::Status {
        status,
        message: message.map(String::from),
    }
}

/// In-memory knowledge service that records every call.
#[derive(Default)]
pub struct MockKnowledge {
    pub calls: Mutex<Vec<String>>,
    pub items: Mutex<Vec<KnowledgeItem>>,
    pub failure: Mutex<Option<(StatusCode, Option<String>)>>,
}

impl MockKnowledge {
    pub fn with_items(items: Vec<KnowledgeItem>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    pub fn fail_with(&self, status: StatusCode, message: Option<&str>) {
        *self.failure.lock().unwrap() = Some((status, message.map(String::from)));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some((status, message)) => Err(ApiError::Status { status, message }),
            None => Ok(()),
        }
    }

    fn paginate(items: Vec<KnowledgeItem>, page: PageRequest) -> Page<KnowledgeItem> {
        let total = items.len() as u64;
        let size = page.size.max(1);
        let total_pages = total.div_ceil(u64::from(size)) as u32;
        let content: Vec<KnowledgeItem> = items
            .into_iter()
            .skip((page.page * size) as usize)
            .take(size as usize)
            .collect();
        Page {
            content,
            total_elements: total,
            total_pages,
            size,
            number: page.page,
            first: page.page == 0,
            last: total_pages.checked_sub(1) == Some(page.page),
        }
    }
}

#[async_trait]
impl KnowledgeService for MockKnowledge {
    async fn list(&self, page: PageRequest) -> Result<Page<KnowledgeItem>, ApiError> {
        self.record(format!("list {} {}", page.page, page.size))?;
        let items = self.items.lock().unwrap().clone();
        Ok(Self::paginate(items, page))
    }

    async fn get(&self, id: &str) -> Result<KnowledgeItem, ApiError> {
        self.record(format!("get {id}"))?;
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| status_error(StatusCode::NOT_FOUND, Some("Knowledge item not found")))
    }

    async fn create(&self, input: &KnowledgeInput) -> Result<KnowledgeItem, ApiError> {
        self.record(format!("create {}", input.title))?;
        let mut items = self.items.lock().unwrap();
        let mut item = sample_item(&format!("k{}", items.len() + 1), &input.title);
        item.content = input.content.clone();
        item.summary = input.summary.clone();
        item.tags = input.tags.clone();
        item.source_url = input.source_url.clone();
        items.push(item.clone());
        Ok(item)
    }

    async fn update(&self, id: &str, input: &KnowledgeInput) -> Result<KnowledgeItem, ApiError> {
        self.record(format!("update {id}"))?;
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| status_error(StatusCode::NOT_FOUND, None))?;
        item.title = input.title.clone();
        item.content = input.content.clone();
        item.summary = input.summary.clone();
        item.tags = input.tags.clone();
        Ok(item.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("delete {id}"))?;
        self.items.lock().unwrap().retain(|i| i.id != id);
        Ok(())
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ApiError> {
        self.record(format!("search {}", request.query))?;
        let needle = request.query.to_lowercase();
        let matches: Vec<KnowledgeItem> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        let page = Self::paginate(
            matches,
            PageRequest::new(request.page.unwrap_or(0), request.size.unwrap_or(10)),
        );
        Ok(SearchResponse {
            results: page
                .content
                .into_iter()
                .map(|item| SearchResult {
                    highlights: vec![format!("<em>{}</em>", item.title)],
                    knowledge_item: item,
                    score: 0.9,
                })
                .collect(),
            total_count: page.total_elements,
            page: page.number,
            size: page.size,
            total_pages: page.total_pages,
        })
    }

    async fn by_tag(&self, tag: &str, page: PageRequest) -> Result<Page<KnowledgeItem>, ApiError> {
        self.record(format!("tag {tag} {}", page.page))?;
        let tagged: Vec<KnowledgeItem> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.tags.iter().any(|t| t == tag))
            .cloned()
            .collect();
        Ok(Self::paginate(tagged, page))
    }
}

/// In-memory sources service that records every call.
#[derive(Default)]
pub struct MockSources {
    pub calls: Mutex<Vec<String>>,
    pub sources: Mutex<Vec<KnowledgeSource>>,
    pub failure: Mutex<Option<(StatusCode, Option<String>)>>,
    pub connection: Mutex<Option<ConnectionTest>>,
}

impl MockSources {
    pub fn with_sources(sources: Vec<KnowledgeSource>) -> Self {
        Self {
            sources: Mutex::new(sources),
            ..Self::default()
        }
    }

    pub fn fail_with(&self, status: StatusCode, message: Option<&str>) {
        *self.failure.lock().unwrap() = Some((status, message.map(String::from)));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        match self.failure.lock().unwrap().clone() {
            Some((status, message)) => Err(ApiError::Status { status, message }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SourcesService for MockSources {
    async fn list(&self, page: PageRequest) -> Result<Page<KnowledgeSource>, ApiError> {
        self.record(format!("list {} {}", page.page, page.size))?;
        let sources = self.sources.lock().unwrap().clone();
        let total = sources.len() as u64;
        Ok(Page {
            content: sources,
            total_elements: total,
            total_pages: u32::from(total > 0),
            size: page.size,
            number: page.page,
            first: true,
            last: true,
        })
    }

    async fn get(&self, id: &str) -> Result<KnowledgeSource, ApiError> {
        self.record(format!("get {id}"))?;
        self.sources
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| status_error(StatusCode::NOT_FOUND, Some("Knowledge source not found")))
    }

    async fn create(&self, request: &CreateSourceRequest) -> Result<KnowledgeSource, ApiError> {
        self.record(format!("create {}", request.kind))?;
        let mut sources = self.sources.lock().unwrap();
        let source = KnowledgeSource {
            id: format!("s{}", sources.len() + 1),
            config: SourceConfig::from_wire(request.kind, request.configuration.clone()),
            is_active: request.is_active.unwrap_or(true),
            last_sync: None,
            created_at: None,
            updated_at: None,
        };
        sources.push(source.clone());
        Ok(source)
    }

    async fn update(
        &self,
        id: &str,
        request: &UpdateSourceRequest,
    ) -> Result<KnowledgeSource, ApiError> {
        self.record(format!("update {id}"))?;
        let mut sources = self.sources.lock().unwrap();
        let source = sources
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| status_error(StatusCode::NOT_FOUND, None))?;
        if let Some(configuration) = &request.configuration {
            source.config = SourceConfig::from_wire(source.kind(), configuration.clone());
        }
        if let Some(active) = request.is_active {
            source.is_active = active;
        }
        Ok(source.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("delete {id}"))?;
        self.sources.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }

    async fn sync(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("sync {id}"))?;
        if let Some(source) = self.sources.lock().unwrap().iter_mut().find(|s| s.id == id) {
            source.last_sync = Timestamp::parse("2024-06-01T12:00:00Z");
        }
        Ok(())
    }

    async fn test_connection(
        &self,
        request: &CreateSourceRequest,
    ) -> Result<ConnectionTest, ApiError> {
        self.record(format!("test {}", request.kind))?;
        Ok(self.connection.lock().unwrap().clone().unwrap_or(ConnectionTest {
            success: true,
            message: None,
        }))
    }
}

/// Auth service accepting the password `secret` for any username.
pub struct MockAuth {
    pub calls: Mutex<Vec<String>>,
    pub session: Arc<Session>,
}

impl MockAuth {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            session,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthService for MockAuth {
    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("login {}", credentials.username));
        if credentials.password != "secret" {
            return Err(status_error(
                StatusCode::UNAUTHORIZED,
                Some("Invalid username or password"),
            ));
        }
        let response = LoginResponse {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            user: sample_user(&credentials.username),
        };
        self.session
            .establish(&response.access_token, &response.refresh_token, &response.user)?;
        Ok(response)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("register {}", request.username));
        if request.username == "taken" {
            return Err(status_error(StatusCode::CONFLICT, Some("Username already exists")));
        }
        Ok(sample_user(&request.username))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push("logout".into());
        self.session.clear()?;
        Ok(())
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.calls.lock().unwrap().push("me".into());
        self.session
            .current_user()
            .ok_or_else(|| status_error(StatusCode::UNAUTHORIZED, None))
    }

    async fn refresh(&self) -> Result<RefreshResponse, ApiError> {
        self.calls.lock().unwrap().push("refresh".into());
        self.session.refresh_token().ok_or(ApiError::NoRefreshToken)?;
        let response = RefreshResponse {
            access_token: "access-2".into(),
            user: sample_user("refreshed"),
        };
        self.session.refreshed(&response.access_token, &response.user)?;
        Ok(response)
    }
}

// ------------------------------------------------------------
// HTTP adapter against an in-process server
// ------------------------------------------------------------

type Recorder = Arc<Mutex<Vec<String>>>;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string()
}

fn user_json() -> Value {
    json!({"id": "u1", "username": "ada", "email": "ada@example.com", "roles": ["USER"]})
}

fn item_json(id: &str) -> Value {
    json!({"id": id, "title": format!("Item {id}"), "content": "body", "sourceType": "MANUAL", "tags": []})
}

fn api_router(rec: Recorder) -> Router {
    Router::new()
        .route(
            "/api/auth/login",
            post(|State(rec): State<Recorder>, Json(body): Json<Value>| async move {
                rec.lock().unwrap().push(format!("login {}", body["username"]));
                if body["password"] == "secret" {
                    Ok(Json(json!({
                        "accessToken": "tok-1",
                        "refreshToken": "ref-1",
                        "user": user_json()
                    })))
                } else {
                    Err((AxumStatus::UNAUTHORIZED, Json(json!({"message": "Bad credentials"}))))
                }
            }),
        )
        .route(
            "/api/auth/refresh",
            post(|State(rec): State<Recorder>, Json(body): Json<Value>| async move {
                rec.lock().unwrap().push(format!("refresh {}", body["refreshToken"]));
                Json(json!({"accessToken": "tok-2", "user": user_json()}))
            }),
        )
        .route(
            "/api/knowledge",
            get(
                |State(rec): State<Recorder>,
                 headers: HeaderMap,
                 Query(q): Query<HashMap<String, String>>| async move {
                    rec.lock().unwrap().push(format!(
                        "list page={} size={} auth={}",
                        q["page"],
                        q["size"],
                        bearer(&headers)
                    ));
                    Json(json!({
                        "content": [item_json("k1")],
                        "totalElements": 1,
                        "totalPages": 1,
                        "size": 20,
                        "number": 0,
                        "first": true,
                        "last": true
                    }))
                },
            ),
        )
        .route(
            "/api/knowledge/{id}",
            get(|Path(id): Path<String>| async move {
                if id == "missing" {
                    Err((AxumStatus::NOT_FOUND, "plain text body"))
                } else if id == "garbled" {
                    Ok(Json(json!({"unexpected": true})))
                } else {
                    Ok(Json(item_json(&id)))
                }
            })
            .delete(|State(rec): State<Recorder>, Path(id): Path<String>| async move {
                rec.lock().unwrap().push(format!("delete {id}"));
                AxumStatus::NO_CONTENT
            }),
        )
        .route(
            "/api/knowledge/tags/{tag}",
            get(
                |State(rec): State<Recorder>,
                 Path(tag): Path<String>,
                 Query(q): Query<HashMap<String, String>>| async move {
                    rec.lock().unwrap().push(format!("tag {tag} page={}", q["page"]));
                    Json(json!({"content": [], "totalElements": 0, "totalPages": 0, "size": 20, "number": 0}))
                },
            ),
        )
        .route(
            "/api/knowledge/search",
            post(|State(rec): State<Recorder>, Json(body): Json<Value>| async move {
                rec.lock().unwrap().push(format!("search {body}"));
                Json(json!({
                    "results": [{"knowledgeItem": item_json("k9"), "score": 0.7, "highlights": ["<em>body</em>"]}],
                    "totalCount": 37,
                    "page": 2,
                    "size": 10,
                    "totalPages": 4
                }))
            }),
        )
        .route(
            "/api/knowledge-sources/{id}/sync",
            post(|State(rec): State<Recorder>, Path(id): Path<String>| async move {
                rec.lock().unwrap().push(format!("sync {id}"));
                AxumStatus::ACCEPTED
            }),
        )
        .route(
            "/api/knowledge-sources/test",
            post(|Json(body): Json<Value>| async move {
                let ok = body["configuration"]["token"] == "good";
                Json(json!({"success": ok, "message": if ok { "Connected" } else { "Bad token" }}))
            }),
        )
        .with_state(rec)
}

async fn http_services() -> (tempfile::TempDir, Arc<Session>, Services, Recorder) {
    let rec: Recorder = Arc::new(Mutex::new(Vec::new()));
    let base = serve(api_router(rec.clone())).await;
    let (dir, session) = temp_session();
    let session = Arc::new(session);
    let services = Services::http(ApiClient::new(base, session.clone()));
    (dir, session, services, rec)
}

#[tokio::test]
async fn login_establishes_session_and_later_calls_carry_bearer() {
    let (_dir, session, services, rec) = http_services().await;

    let before = services.knowledge.list(PageRequest::new(0, 20)).await.unwrap();
    assert_eq!(before.content.len(), 1);

    let response = services
        .auth
        .login(&LoginRequest {
            username: "ada".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
    assert_eq!(response.user.username, "ada");
    assert!(session.is_authenticated());
    assert_eq!(session.refresh_token().as_deref(), Some("ref-1"));

    services.knowledge.list(PageRequest::new(1, 5)).await.unwrap();

    let calls = rec.lock().unwrap().clone();
    assert_eq!(calls[0], "list page=0 size=20 auth=none");
    assert_eq!(calls[1], "login \"ada\"");
    assert_eq!(calls[2], "list page=1 size=5 auth=Bearer tok-1");
}

#[tokio::test]
async fn failed_login_surfaces_server_message_and_leaves_session_empty() {
    let (_dir, session, services, _rec) = http_services().await;
    let err = services
        .auth
        .login(&LoginRequest {
            username: "ada".into(),
            password: "wrong".into(),
        })
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.user_message("Login failed. Please try again."), "Bad credentials");
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn refresh_requires_stored_token_then_updates_access_token() {
    let (_dir, session, services, rec) = http_services().await;

    let err = services.auth.refresh().await.unwrap_err();
    assert!(matches!(err, ApiError::NoRefreshToken));
    assert!(rec.lock().unwrap().is_empty(), "no request without a refresh token");

    session.establish("tok-1", "ref-1", &sample_user("ada")).unwrap();
    services.auth.refresh().await.unwrap();
    assert_eq!(session.access_token().as_deref(), Some("tok-2"));
    assert_eq!(rec.lock().unwrap().last().unwrap(), "refresh \"ref-1\"");

    services.auth.logout().await.unwrap();
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn non_json_error_body_has_no_message() {
    let (_dir, _session, services, _rec) = http_services().await;
    let err = services.knowledge.get("missing").await.unwrap_err();
    match &err {
        ApiError::Status { status, message } => {
            assert_eq!(*status, StatusCode::NOT_FOUND);
            assert_eq!(message, &None);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.user_message("Failed to load knowledge item"), "Failed to load knowledge item");
}

#[tokio::test]
async fn malformed_success_body_is_a_decode_error() {
    let (_dir, _session, services, _rec) = http_services().await;
    let err = services.knowledge.get("garbled").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn search_posts_request_and_normalizes() {
    let (_dir, _session, services, rec) = http_services().await;
    let response = services
        .knowledge
        .search(&SearchRequest::new("body", 2, 10))
        .await
        .unwrap();
    assert_eq!(response.results[0].highlights, vec!["<em>body</em>"]);

    let page = response.into_page();
    assert_eq!(page.number, 2);
    assert_eq!(page.total_elements, 37);
    assert!(!page.last);

    let call = rec.lock().unwrap()[0].clone();
    assert!(call.contains("\"query\":\"body\""));
    assert!(call.contains("\"page\":2"));
}

#[tokio::test]
async fn tag_path_is_percent_encoded() {
    let (_dir, _session, services, rec) = http_services().await;
    services
        .knowledge
        .by_tag("c++ tips/tricks", PageRequest::new(3, 20))
        .await
        .unwrap();
    assert_eq!(rec.lock().unwrap()[0], "tag c++ tips/tricks page=3");
}

#[tokio::test]
async fn delete_and_sync_accept_empty_bodies() {
    let (_dir, _session, services, rec) = http_services().await;
    services.knowledge.delete("k1").await.unwrap();
    services.sources.sync("s1").await.unwrap();
    assert_eq!(rec.lock().unwrap().clone(), vec!["delete k1", "sync s1"]);
}

#[tokio::test]
async fn connection_test_reports_outcome() {
    let (_dir, _session, services, _rec) = http_services().await;
    let mut config = SourceConfig::empty(crate::model::source::SourceKind::Github);
    config.set("owner", "octo");
    config.set("token", "good");
    let ok = services
        .sources
        .test_connection(&CreateSourceRequest::new(&config, true))
        .await
        .unwrap();
    assert!(ok.success);
    assert_eq!(ok.message.as_deref(), Some("Connected"));

    config.set("token", "bad");
    let failed = services
        .sources
        .test_connection(&CreateSourceRequest::new(&config, true))
        .await
        .unwrap();
    assert!(!failed.success);
}

#[tokio::test]
async fn transport_failure_is_reported() {
    let (_dir, session) = temp_session();
    // Nothing listens on port 9 (discard) in the test environment.
    let services = Services::http(ApiClient::new("http://127.0.0.1:9/api", Arc::new(session)));
    let err = services.knowledge.list(PageRequest::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.user_message("Failed to fetch"), "Failed to fetch");
}

#[tokio::test]
async fn mock_knowledge_paginates_consistently() {
    let items = (1..=25).map(|i| sample_item(&format!("k{i}"), "Item")).collect();
    let mock = MockKnowledge::with_items(items);
    let first = mock.list(PageRequest::new(2, 10)).await.unwrap();
    let again = mock.list(PageRequest::new(2, 10)).await.unwrap();
    assert_eq!(first.total_elements, again.total_elements);
    assert_eq!(first.content.len(), 5);
    assert!(first.last);
}
