//! Session store actions: login, registration, logout and the
//! session-scoped collection fetches.
//!
//! ERROR HANDLING
//! ==============
//! Actions never hand a gateway error to their caller. Every failure is
//! recorded in `Session::error` and returned as an [`ActionFailure`] whose
//! message comes from [`failure_message`]: the backend's `detail` when it
//! sent one, otherwise the action's fixed fallback.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::net::gateway::{ApiRequest, Gateway, GatewayError, path_segment};
use crate::net::payload::FormData;
use crate::net::types::LoginResponse;
use crate::state::session::Session;

pub const LOGIN_FAILED: &str = "登录失败，请检查网络连接";
pub const REGISTER_FAILED: &str = "注册失败，请检查网络连接";
pub const FETCH_CONVERSATIONS_FAILED: &str = "获取会话历史失败";
pub const DELETE_CONVERSATION_FAILED: &str = "删除会话失败";
pub const FETCH_KNOWLEDGE_BASES_FAILED: &str = "获取知识库失败";

/// User-facing reason an action did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ActionFailure {
    pub message: String,
}

pub type ActionResult<T = ()> = Result<T, ActionFailure>;

/// The one place that turns a gateway error into a user-facing message.
#[must_use]
pub fn failure_message(error: &GatewayError, fallback: &str) -> String {
    error.detail().unwrap_or_else(|| fallback.to_owned())
}

#[derive(Clone, Debug)]
pub struct Store {
    session: Arc<Session>,
    gateway: Gateway,
}

impl Store {
    #[must_use]
    pub fn new(session: Arc<Session>, gateway: Gateway) -> Self {
        Self { session, gateway }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn fail(&self, error: &GatewayError, fallback: &str) -> ActionFailure {
        let message = failure_message(error, fallback);
        tracing::warn!(error = %error, message = %message, "store action failed");
        self.session.set_error(message.clone());
        ActionFailure { message }
    }

    /// Exchange credentials for a token and persist the new session.
    pub async fn login(&self, username: &str, password: &str) -> ActionResult {
        let _loading = self.session.loading_guard();
        self.session.clear_error();

        let form = FormData::new().text("username", username).text("password", password);
        let response: LoginResponse = self
            .gateway
            .send_as(ApiRequest::post("/auth/login", form))
            .await
            .map_err(|e| self.fail(&e, LOGIN_FAILED))?;

        let token = response.authorization();
        let user = response.user();
        if let Err(e) = self.session.establish(token, user) {
            tracing::error!(error = %e, "failed to persist session");
            self.session.set_error(LOGIN_FAILED);
            return Err(ActionFailure { message: LOGIN_FAILED.to_owned() });
        }

        tracing::info!(username = %response.username, "logged in");
        Ok(())
    }

    /// Forward arbitrary registration fields. The session is not touched.
    pub async fn register(&self, fields: Map<String, Value>) -> ActionResult<Value> {
        let _loading = self.session.loading_guard();
        self.session.clear_error();

        self.gateway
            .post("/auth/register", Value::Object(fields))
            .await
            .map_err(|e| self.fail(&e, REGISTER_FAILED))
    }

    /// Local sign-out; no network call.
    pub fn logout(&self) {
        self.session.clear();
        tracing::info!("logged out");
    }

    /// Load the conversation history (`GET /conversations`) into the session.
    pub async fn fetch_conversations(&self) -> ActionResult<Value> {
        let _loading = self.session.loading_guard();

        let conversations = self
            .gateway
            .get("/conversations")
            .await
            .map_err(|e| self.fail(&e, FETCH_CONVERSATIONS_FAILED))?;
        self.session.set_conversations(conversations.clone());
        Ok(conversations)
    }

    /// Delete one conversation (`DELETE /conversations/{id}`).
    pub async fn delete_conversation(&self, id: &str) -> ActionResult {
        let _loading = self.session.loading_guard();

        self.gateway
            .delete(&format!("/conversations/{}", path_segment(id)))
            .await
            .map_err(|e| self.fail(&e, DELETE_CONVERSATION_FAILED))?;
        Ok(())
    }

    /// Load the knowledge bases (`GET /list_knowledge_bases`) into the session.
    pub async fn fetch_knowledge_bases(&self) -> ActionResult<Value> {
        let _loading = self.session.loading_guard();

        let knowledge_bases = self
            .gateway
            .get("/list_knowledge_bases")
            .await
            .map_err(|e| self.fail(&e, FETCH_KNOWLEDGE_BASES_FAILED))?;
        self.session.set_knowledge_bases(knowledge_bases.clone());
        Ok(knowledge_bases)
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
