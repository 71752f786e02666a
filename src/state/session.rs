//! Session: the single source of truth for authentication state.
//!
//! SYSTEM CONTEXT
//! ==============
//! Read by the navigation guard (is the user signed in?) and the gateway
//! (which `Authorization` value to send), written by the store's actions and
//! by the gateway's unauthorized handler. It is also the only code that
//! touches the persisted `token` / `user` keys.
//!
//! INVARIANTS
//! ==========
//! - A non-empty `token` is what "signed in" means. A stale `user` with an
//!   empty token never grants anything: every user getter checks the token.
//! - Memory and storage change together. The one exception is hydration,
//!   which copies storage into memory when memory is behind.
//!
//! Locks are held only for the synchronous bookkeeping, never across an
//! `.await`.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use crate::net::types::User;
use crate::storage::{Storage, StorageError, TOKEN_KEY, USER_KEY};

/// Plain snapshot of the session store.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    /// `"<scheme> <credential>"`, empty when signed out.
    pub token: String,
    pub user: Option<User>,
    /// True while an action of the store is in flight.
    pub loading: bool,
    /// Last error message surfaced to the user.
    pub error: Option<String>,
    pub conversations: Value,
    pub knowledge_bases: Value,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            token: String::new(),
            user: None,
            loading: false,
            error: None,
            conversations: Value::Array(Vec::new()),
            knowledge_bases: Value::Array(Vec::new()),
        }
    }
}

impl SessionState {
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        !self.token.is_empty()
    }
}

pub struct Session {
    storage: Arc<dyn Storage>,
    state: RwLock<SessionState>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.read())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create an empty session over `storage`. Call [`Session::bootstrap`]
    /// to pick up a previously persisted login.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage, state: RwLock::new(SessionState::default()) }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // HYDRATION
    // =========================================================================

    /// Process-start hydration from persisted storage.
    pub fn bootstrap(&self) -> bool {
        let hydrated = self.hydrate_if_behind();
        if hydrated {
            tracing::info!(user = ?self.username(), "session restored from storage");
        } else {
            tracing::debug!("no persisted session");
        }
        hydrated
    }

    /// Copy storage into memory when storage holds a token memory lacks,
    /// e.g. after another process signed in on the same storage file.
    pub fn reconcile(&self) -> bool {
        self.hydrate_if_behind()
    }

    fn hydrate_if_behind(&self) -> bool {
        let mut state = self.write();
        if state.is_logged_in() {
            return false;
        }
        let Some(token) = self.stored_token() else {
            return false;
        };
        state.token = token;
        state.user = None;

        if let Some(raw) = self.storage.get(USER_KEY) {
            match serde_json::from_str::<User>(&raw) {
                Ok(user) => state.user = Some(user),
                Err(e) => tracing::warn!(error = %e, "failed to parse stored user; continuing without profile"),
            }
        }
        true
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Record a fresh login in memory and storage.
    ///
    /// # Errors
    ///
    /// Returns an error if storage rejects the write. Memory is left untouched
    /// and any partially written keys are removed.
    pub fn establish(&self, token: String, user: User) -> Result<(), StorageError> {
        let mut state = self.write();
        let user_json =
            serde_json::to_string(&user).map_err(|source| StorageError::Encode { key: USER_KEY, source })?;

        if let Err(e) = self
            .storage
            .set(TOKEN_KEY, &token)
            .and_then(|()| self.storage.set(USER_KEY, &user_json))
        {
            self.remove_persisted();
            return Err(e);
        }

        state.token = token;
        state.user = Some(user);
        Ok(())
    }

    /// Sign out locally. Safe to call when already signed out.
    pub fn clear(&self) {
        let mut state = self.write();
        state.token.clear();
        state.user = None;
        self.remove_persisted();
    }

    /// Forced sign-out after the backend rejected the credentials.
    ///
    /// Returns `true` only when a live session was actually cleared, so
    /// several simultaneous rejections produce a single redirect.
    pub fn expire(&self) -> bool {
        let mut state = self.write();
        let was_live = state.is_logged_in() || self.stored_token().is_some();
        state.token.clear();
        state.user = None;
        if was_live {
            self.remove_persisted();
        }
        was_live
    }

    fn remove_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "failed to remove persisted session key");
            }
        }
    }

    // =========================================================================
    // GETTERS
    // =========================================================================

    /// Token as currently persisted. The gateway trusts this at request time.
    #[must_use]
    pub fn stored_token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.read().is_logged_in()
    }

    #[must_use]
    pub fn token(&self) -> String {
        self.read().token.clone()
    }

    /// The signed-in user. `None` whenever the token is empty.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        let state = self.read();
        if state.is_logged_in() { state.user.clone() } else { None }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(|u| u.is_admin)
    }

    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.user().map(|u| u.username)
    }

    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.user().map(|u| u.id)
    }

    /// `Authorization` header value for the in-memory session. The token
    /// already carries its scheme.
    #[must_use]
    pub fn auth_header(&self) -> Option<String> {
        let state = self.read();
        state.is_logged_in().then(|| state.token.clone())
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.read().loading
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    #[must_use]
    pub fn conversations(&self) -> Value {
        self.read().conversations.clone()
    }

    #[must_use]
    pub fn knowledge_bases(&self) -> Value {
        self.read().knowledge_bases.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.read().clone()
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Memory-only; use [`Session::establish`] to also persist.
    pub fn set_token(&self, token: impl Into<String>) {
        self.write().token = token.into();
    }

    /// Memory-only; use [`Session::establish`] to also persist.
    pub fn set_user(&self, user: Option<User>) {
        self.write().user = user;
    }

    pub fn set_loading(&self, loading: bool) {
        self.write().loading = loading;
    }

    pub fn set_error(&self, message: impl Into<String>) {
        self.write().error = Some(message.into());
    }

    pub fn clear_error(&self) {
        self.write().error = None;
    }

    pub fn set_conversations(&self, conversations: Value) {
        self.write().conversations = conversations;
    }

    pub fn set_knowledge_bases(&self, knowledge_bases: Value) {
        self.write().knowledge_bases = knowledge_bases;
    }

    /// Mark the store busy until the returned guard drops.
    #[must_use]
    pub fn loading_guard(&self) -> LoadingGuard<'_> {
        self.set_loading(true);
        LoadingGuard { session: self }
    }
}

/// Resets `loading` on drop, on success and failure paths alike.
pub struct LoadingGuard<'a> {
    session: &'a Session,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.session.set_loading(false);
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
