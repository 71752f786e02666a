//! Application context: every long-lived component, built once and passed
//! around explicitly.
//!
//! SYSTEM CONTEXT
//! ==============
//! `App::new` is the bootstrap step. It wires storage, session, gateway,
//! store, endpoint catalog and router around a single event bus, then
//! restores any persisted session before the first navigation.
//!
//! The session watcher is the shell's reaction to cross-component events:
//! an expired session becomes a router navigation to the login page rather
//! than a full restart.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::config::{ClientConfig, ConfigError};
use crate::events::{AppEvent, EventBus, NoticeLevel};
use crate::net::api::Api;
use crate::net::gateway::{Gateway, GatewayError};
use crate::router::Router;
use crate::router::routes::{RouteTable, default_routes};
use crate::state::session::Session;
use crate::state::store::Store;
use crate::storage::{FileStorage, MemoryStorage, Storage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Clone, Debug)]
pub struct App {
    pub config: ClientConfig,
    pub events: EventBus,
    pub session: Arc<Session>,
    pub gateway: Gateway,
    pub store: Store,
    pub api: Api,
    pub router: Arc<Router>,
}

impl App {
    /// Wire all components over `storage` and restore a persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, AppError> {
        let events = EventBus::default();
        let session = Arc::new(Session::new(storage));
        let gateway = Gateway::new(&config, session.clone(), events.clone())?;
        let store = Store::new(session.clone(), gateway.clone());
        let api = Api::new(gateway.clone());
        let routes = Arc::new(RouteTable::new(&default_routes()));
        let router = Arc::new(Router::new(routes, session.clone(), events.clone()));

        session.bootstrap();
        tracing::info!(base_url = %gateway.base_url(), env = ?config.environment, "client ready");

        Ok(Self { config, events, session, gateway, store, api, router })
    }

    /// Like [`App::new`], choosing file-backed storage when the config names
    /// a path and in-memory storage otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage file cannot be read, or the
    /// HTTP client cannot be built.
    pub fn from_config(config: ClientConfig) -> Result<Self, AppError> {
        let storage: Arc<dyn Storage> = match &config.storage_path {
            Some(path) => Arc::new(FileStorage::open(path)?),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::new(config, storage)
    }

    /// Follow application events until the bus closes.
    ///
    /// Subscribes before returning, so events emitted after this call are
    /// never missed.
    #[must_use]
    pub fn spawn_session_watcher(&self) -> JoinHandle<()> {
        let mut rx = self.events.subscribe();
        let router = self.router.clone();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(AppEvent::SessionExpired { redirect_to }) => match router.push(&redirect_to) {
                        Ok(nav) => tracing::info!(to = %nav.location, "session expired; returned to login"),
                        Err(e) => tracing::error!(error = %e, "session expiry redirect failed"),
                    },
                    Ok(AppEvent::Notice { level, message }) => match level {
                        NoticeLevel::Info => tracing::info!(%message, "notice"),
                        NoticeLevel::Warning => tracing::warn!(%message, "notice"),
                        NoticeLevel::Error => tracing::error!(%message, "notice"),
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session watcher lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;
