//! Global before-navigation hook.
//!
//! Runs on every navigation: decides the page title, blocks pages that need
//! a session when there is none, and otherwise lets the session catch up with
//! storage (another process may have signed in since start-up).

use std::sync::Arc;

use super::routes::{APP_TITLE, Location, RouteTable};
use crate::events::EventBus;
use crate::net::gateway::LOGIN_PATH;
use crate::state::session::Session;

pub const LOGIN_REQUIRED: &str = "请先登录再访问此功能";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow { title: String },
    Redirect { to: Location, title: String },
}

impl GuardDecision {
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Allow { title } | Self::Redirect { title, .. } => title,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NavigationGuard {
    routes: Arc<RouteTable>,
    session: Arc<Session>,
    events: EventBus,
}

impl NavigationGuard {
    #[must_use]
    pub fn new(routes: Arc<RouteTable>, session: Arc<Session>, events: EventBus) -> Self {
        Self { routes, session, events }
    }

    pub fn before_each(&self, to: &Location) -> GuardDecision {
        let matched = self.routes.resolve(&to.path);
        let title = matched.as_ref().map_or_else(|| APP_TITLE.to_owned(), |m| m.title());

        if matched.as_ref().is_some_and(|m| m.requires_auth()) {
            if self.session.is_logged_in() {
                return GuardDecision::Allow { title };
            }
            tracing::info!(path = %to.path, "blocked navigation without session");
            self.events.warn(LOGIN_REQUIRED);
            let login = Location::parse(LOGIN_PATH).with_query("redirect", to.full_path());
            return GuardDecision::Redirect { to: login, title };
        }

        if self.session.reconcile() {
            tracing::debug!("session picked up from storage during navigation");
        }
        GuardDecision::Allow { title }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
