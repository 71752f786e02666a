use std::sync::Arc;

use super::*;
use crate::router::routes::{RouteRecord, default_routes};
use crate::storage::MemoryStorage;
use crate::test_support::amy;

fn router_with(records: &[RouteRecord]) -> (Arc<Session>, Router) {
    let session = Arc::new(Session::new(Arc::new(MemoryStorage::new())));
    let router = Router::new(Arc::new(RouteTable::new(records)), session.clone(), EventBus::default());
    (session, router)
}

#[test]
fn starts_at_root_with_app_title() {
    let (_, router) = router_with(&default_routes());
    let current = router.current();
    assert_eq!(current.location.path, "/");
    assert_eq!(current.title, APP_TITLE);
}

#[test]
fn push_follows_login_redirect() {
    let (_, router) = router_with(&default_routes());

    let nav = router.push("/knowledge/builder").unwrap();
    assert_eq!(nav.location.path, "/login");
    assert_eq!(nav.location.redirect_target(), "/knowledge/builder");
    assert_eq!(nav.title, "登录 - 软件工程课程智能助手");
    assert_eq!(nav.route.as_deref(), Some("Login"));
    assert_eq!(router.current(), nav);
}

#[test]
fn push_after_login_lands_on_target() {
    let (session, router) = router_with(&default_routes());
    session.establish("Bearer abc123".into(), amy()).unwrap();

    let nav = router.push("/paper/learning-path").unwrap();
    assert_eq!(nav.location.path, "/paper/learning-path");
    assert_eq!(nav.route.as_deref(), Some("PaperLearningPath"));
}

#[test]
fn unknown_path_lands_on_not_found() {
    let (_, router) = router_with(&default_routes());
    let nav = router.push("/missing/page").unwrap();
    assert_eq!(nav.route.as_deref(), Some("NotFound"));
}

#[test]
fn protected_login_page_is_a_loop() {
    let (_, router) = router_with(&[RouteRecord::new("/login", "Login").requires_auth()]);
    assert_eq!(router.push("/login"), Err(RouterError::RedirectLoop("/login".into())));
    // Failed navigation leaves the current location alone.
    assert_eq!(router.current().location.path, "/");
}
