use serde_json::json;

use super::*;
use crate::events::AppEvent;
use crate::net::types::User;
use crate::storage::{Storage, TOKEN_KEY, USER_KEY};
use crate::test_support::{GOOD_TOKEN, Wired, amy, dead_base_url, spawn_backend, test_config, wire};

fn store(wired: &Wired) -> Store {
    Store::new(wired.session.clone(), wired.gateway.clone())
}

// =============================================================
// failure_message policy
// =============================================================

#[test]
fn failure_message_prefers_detail() {
    let err = GatewayError::Status { status: 400, body: json!({"detail": "X"}) };
    assert_eq!(failure_message(&err, LOGIN_FAILED), "X");
}

#[test]
fn failure_message_falls_back() {
    let err = GatewayError::Status { status: 500, body: json!("internal") };
    assert_eq!(failure_message(&err, LOGIN_FAILED), LOGIN_FAILED);
    let err = GatewayError::NoResponse("refused".into());
    assert_eq!(failure_message(&err, REGISTER_FAILED), REGISTER_FAILED);
}

// =============================================================
// login
// =============================================================

#[tokio::test]
async fn login_success_persists_token_and_user() {
    let backend = spawn_backend().await;
    let wired = wire(&test_config(&backend.base_url));
    let store = store(&wired);

    store.login("amy", "pw").await.unwrap();

    assert_eq!(wired.session.token(), "Bearer abc123");
    assert_eq!(wired.session.user(), Some(amy()));
    assert_eq!(wired.storage.get(TOKEN_KEY).as_deref(), Some("Bearer abc123"));
    let stored: User = serde_json::from_str(&wired.storage.get(USER_KEY).unwrap()).unwrap();
    assert_eq!(stored, amy());
    assert!(!wired.session.loading());
    assert!(wired.session.error().is_none());
}

#[tokio::test]
async fn login_admin_sets_admin_flag() {
    let backend = spawn_backend().await;
    let wired = wire(&test_config(&backend.base_url));
    store(&wired).login("admin", "pw").await.unwrap();
    assert!(wired.session.is_admin());
    assert_eq!(wired.session.token(), "Bearer root");
}

#[tokio::test]
async fn login_failure_surfaces_detail_and_clears_loading() {
    let backend = spawn_backend().await;
    let wired = wire(&test_config(&backend.base_url));
    let store = store(&wired);
    let mut rx = wired.events.subscribe();

    let err = store.login("amy", "wrong").await.unwrap_err();
    assert_eq!(err.message, "用户名或密码错误");
    assert_eq!(wired.session.error().as_deref(), Some("用户名或密码错误"));
    assert!(!wired.session.is_logged_in());
    assert!(!wired.session.loading());
    // A rejected login is not an expired session.
    assert!(!matches!(rx.try_recv(), Ok(AppEvent::SessionExpired { .. })));
}

#[tokio::test]
async fn login_failure_without_detail_uses_fallback() {
    let backend = spawn_backend().await;
    let wired = wire(&test_config(&backend.base_url));

    let err = store(&wired).login("", "pw").await.unwrap_err();
    assert_eq!(err.message, LOGIN_FAILED);
    assert_eq!(err.to_string(), LOGIN_FAILED);
}

#[tokio::test]
async fn login_network_failure_uses_fallback() {
    let wired = wire(&test_config(&dead_base_url().await));
    let err = store(&wired).login("amy", "pw").await.unwrap_err();
    assert_eq!(err.message, LOGIN_FAILED);
    assert!(!wired.session.loading());
}

#[tokio::test]
async fn login_clears_previous_error() {
    let backend = spawn_backend().await;
    let wired = wire(&test_config(&backend.base_url));
    wired.session.set_error("old");

    store(&wired).login("amy", "pw").await.unwrap();
    assert!(wired.session.error().is_none());
}

// =============================================================
// register
// =============================================================

#[tokio::test]
async fn register_returns_body_without_touching_token() {
    let backend = spawn_backend().await;
    let wired = wire(&test_config(&backend.base_url));

    let mut fields = Map::new();
    fields.insert("username".into(), json!("new-student"));
    fields.insert("email".into(), json!("s@example.edu"));
    let body = store(&wired).register(fields).await.unwrap();

    assert_eq!(body["username"], "new-student");
    assert!(!wired.session.is_logged_in());
}

#[tokio::test]
async fn register_conflict_surfaces_detail() {
    let backend = spawn_backend().await;
    let wired = wire(&test_config(&backend.base_url));

    let mut fields = Map::new();
    fields.insert("username".into(), json!("taken"));
    let err = store(&wired).register(fields).await.unwrap_err();
    assert_eq!(err.message, "用户名已存在");
}

// =============================================================
// logout
// =============================================================

#[tokio::test]
async fn logout_is_idempotent() {
    let backend = spawn_backend().await;
    let wired = wire(&test_config(&backend.base_url));
    let store = store(&wired);
    store.login("amy", "pw").await.unwrap();

    store.logout();
    store.logout();

    assert_eq!(wired.session.token(), "");
    assert!(wired.session.snapshot().user.is_none());
    assert!(wired.storage.get(TOKEN_KEY).is_none());
    assert!(wired.storage.get(USER_KEY).is_none());
}

// =============================================================
// collections
// =============================================================

#[tokio::test]
async fn fetch_conversations_commits_on_success() {
    let backend = spawn_backend().await;
    let wired = wire(&test_config(&backend.base_url));
    let store = store(&wired);
    store.login("amy", "pw").await.unwrap();

    let conversations = store.fetch_conversations().await.unwrap();
    assert_eq!(conversations.as_array().unwrap().len(), 2);
    assert_eq!(wired.session.conversations(), conversations);
    assert!(!wired.session.loading());
}

#[tokio::test]
async fn fetch_conversations_unauthorized_expires_session() {
    let backend = spawn_backend().await;
    let wired = wire(&test_config(&backend.base_url));
    wired.session.establish("Bearer revoked".into(), amy()).unwrap();
    let mut rx = wired.events.subscribe();

    let err = store(&wired).fetch_conversations().await.unwrap_err();
    assert_eq!(err.message, "Not authenticated");
    assert!(!wired.session.is_logged_in());
    assert!(matches!(rx.try_recv(), Ok(AppEvent::SessionExpired { .. })));
    assert_eq!(wired.session.conversations(), json!([]));
}

#[tokio::test]
async fn fetch_knowledge_bases_commits_on_success() {
    let backend = spawn_backend().await;
    let wired = wire(&test_config(&backend.base_url));
    wired.session.establish(GOOD_TOKEN.into(), amy()).unwrap();

    let bases = store(&wired).fetch_knowledge_bases().await.unwrap();
    assert_eq!(bases, json!([{"name": "se-notes"}]));
    assert_eq!(wired.session.knowledge_bases(), bases);
}

#[tokio::test]
async fn fetch_knowledge_bases_failure_uses_fallback() {
    let backend = spawn_backend().await;
    let wired = wire(&test_config(&backend.base_url));
    wired.session.establish("Bearer other".into(), amy()).unwrap();

    let err = store(&wired).fetch_knowledge_bases().await.unwrap_err();
    assert_eq!(err.message, FETCH_KNOWLEDGE_BASES_FAILED);
    assert_eq!(wired.session.error().as_deref(), Some(FETCH_KNOWLEDGE_BASES_FAILED));
    assert!(!wired.session.loading());
}

#[tokio::test]
async fn delete_conversation_success_and_not_found() {
    let backend = spawn_backend().await;
    let wired = wire(&test_config(&backend.base_url));
    wired.session.establish(GOOD_TOKEN.into(), amy()).unwrap();
    let store = store(&wired);

    store.delete_conversation("7").await.unwrap();
    let err = store.delete_conversation("404").await.unwrap_err();
    assert_eq!(err.message, "会话不存在");
}
