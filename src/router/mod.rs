//! Client-side navigation: route table, guard, and the router that ties
//! them together.
//!
//! DESIGN
//! ======
//! `Router::push` runs the guard for the requested location and follows its
//! redirects until a location is allowed. The resulting location and page
//! title become the router's current state. Redirect chains are bounded.

pub mod guard;
pub mod routes;

use std::sync::{Arc, Mutex, PoisonError};

use guard::{GuardDecision, NavigationGuard};
use routes::{APP_TITLE, Location, RouteTable};

use crate::events::EventBus;
use crate::state::session::Session;

const MAX_REDIRECTS: usize = 8;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("too many redirects navigating to {0}")]
    RedirectLoop(String),
}

/// Where the router currently is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub location: Location,
    pub title: String,
    /// Name of the matched leaf record, if any.
    pub route: Option<String>,
}

#[derive(Debug)]
pub struct Router {
    routes: Arc<RouteTable>,
    guard: NavigationGuard,
    current: Mutex<Navigation>,
}

impl Router {
    #[must_use]
    pub fn new(routes: Arc<RouteTable>, session: Arc<Session>, events: EventBus) -> Self {
        let guard = NavigationGuard::new(routes.clone(), session, events);
        let current = Navigation { location: Location::parse("/"), title: APP_TITLE.to_owned(), route: None };
        Self { routes, guard, current: Mutex::new(current) }
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[must_use]
    pub fn current(&self) -> Navigation {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Navigate to `target` (`path?query`).
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::RedirectLoop`] when guard redirects do not settle.
    pub fn push(&self, target: &str) -> Result<Navigation, RouterError> {
        let mut location = Location::parse(target);

        for _ in 0..=MAX_REDIRECTS {
            match self.guard.before_each(&location) {
                GuardDecision::Allow { title } => {
                    let route = self.routes.resolve(&location.path).and_then(|m| m.leaf().map(|r| r.name.clone()));
                    let navigation = Navigation { location, title, route };
                    tracing::debug!(to = %navigation.location, title = %navigation.title, "navigated");
                    *self.current.lock().unwrap_or_else(PoisonError::into_inner) = navigation.clone();
                    return Ok(navigation);
                }
                GuardDecision::Redirect { to, .. } => {
                    tracing::debug!(from = %location, to = %to, "navigation redirected");
                    location = to;
                }
            }
        }

        tracing::warn!(to = %target, "redirect loop");
        Err(RouterError::RedirectLoop(target.to_owned()))
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
