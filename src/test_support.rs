//! Shared fixtures for tests: an in-process mock backend and wired-up
//! client components pointed at it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Multipart, Path};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::events::EventBus;
use crate::net::gateway::Gateway;
use crate::state::session::Session;
use crate::storage::MemoryStorage;

pub const GOOD_TOKEN: &str = "Bearer abc123";

// =============================================================================
// MOCK BACKEND
// =============================================================================

pub struct MockBackend {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_backend() -> MockBackend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, backend_router()).await.unwrap();
    });
    MockBackend { base_url: format!("http://{addr}/api"), handle }
}

/// Base URL of a port nothing listens on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

fn backend_router() -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/conversations", get(list_conversations).post(echo).delete(echo))
        .route("/api/conversations/{id}", delete(delete_conversation))
        .route("/api/list_knowledge_bases", get(list_knowledge_bases))
        .route("/api/private", get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"}))) }))
        .route("/api/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "internal") }))
        .route(
            "/api/validation",
            get(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"detail": [{"loc": ["body", "question"], "msg": "field required"}]})),
                )
            }),
        )
        .route("/api/empty", get(|| async { StatusCode::NO_CONTENT }))
        .route("/api/plain", get(|| async { "pong" }))
        .route("/api/download", post(|| async { ([(header::CONTENT_TYPE, "application/pdf")], b"%PDF-1.4 fake".to_vec()) }))
        .route(
            "/api/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({"late": true}))
            }),
        )
        .fallback(echo)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok())
}

async fn form_fields(mut multipart: Multipart) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_owned();
        let value = field.text().await.unwrap_or_default();
        fields.insert(name, value);
    }
    fields
}

async fn login(multipart: Multipart) -> Response {
    let fields = form_fields(multipart).await;
    let username = fields.get("username").map_or("", String::as_str);
    let password = fields.get("password").map_or("", String::as_str);
    match (username, password) {
        ("amy", "pw") => Json(json!({
            "access_token": "abc123",
            "token_type": "Bearer",
            "user_id": 1,
            "username": "amy",
            "is_admin": false
        }))
        .into_response(),
        ("admin", "pw") => Json(json!({
            "access_token": "root",
            "token_type": "Bearer",
            "user_id": 2,
            "username": "admin",
            "is_admin": true
        }))
        .into_response(),
        ("", _) => (StatusCode::INTERNAL_SERVER_ERROR, "crash").into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"detail": "用户名或密码错误"}))).into_response(),
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    if body.get("username").and_then(Value::as_str) == Some("taken") {
        return (StatusCode::BAD_REQUEST, Json(json!({"detail": "用户名已存在"}))).into_response();
    }
    Json(json!({"id": 42, "username": body.get("username")})).into_response()
}

async fn list_conversations(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(GOOD_TOKEN) => Json(json!([{"id": 1, "title": "UML 类图"}, {"id": 2, "title": "测试用例"}])).into_response(),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"}))).into_response(),
    }
}

async fn delete_conversation(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if bearer(&headers) != Some(GOOD_TOKEN) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"}))).into_response();
    }
    if id == "404" {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "会话不存在"}))).into_response();
    }
    Json(json!({"deleted": id})).into_response()
}

async fn list_knowledge_bases(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(GOOD_TOKEN) => Json(json!([{"name": "se-notes"}])).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Not authenticated"}))).into_response(),
        Some(_) => (StatusCode::INTERNAL_SERVER_ERROR, "index offline").into_response(),
    }
}

/// Reflects the request back so tests can assert on what was sent.
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "authorization": bearer(&headers),
        "content_type": headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        "body": String::from_utf8_lossy(&body),
    }))
}

// =============================================================================
// CLIENT FIXTURES
// =============================================================================

pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig { api_base_url: base_url.to_owned(), ..ClientConfig::default() }
}

pub struct Wired {
    pub storage: Arc<MemoryStorage>,
    pub session: Arc<Session>,
    pub events: EventBus,
    pub gateway: Gateway,
}

pub fn wire(config: &ClientConfig) -> Wired {
    let storage = Arc::new(MemoryStorage::new());
    let session = Arc::new(Session::new(storage.clone()));
    let events = EventBus::default();
    let gateway = Gateway::new(config, session.clone(), events.clone()).unwrap();
    Wired { storage, session, events, gateway }
}

pub fn amy() -> crate::net::types::User {
    crate::net::types::User { id: 1, username: "amy".into(), is_admin: false }
}
