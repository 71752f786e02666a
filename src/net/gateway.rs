//! HTTP gateway: the only network entry point of the client.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every backend call (login, registration, store fetches and the agent
//! endpoint catalog) goes through one configured `reqwest::Client` and one
//! interceptor chain.
//!
//! DESIGN
//! ======
//! - Request side: the persisted token, read through the session, is attached
//!   as `Authorization` verbatim (it already carries its scheme).
//! - Response side: success yields the body only. Failures are logged by
//!   class and always handed back to the caller.
//! - 401: the session is expired and, if that actually ended a live session,
//!   one `SessionExpired` event is published for the shell to act on.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::payload::Payload;
use crate::config::ClientConfig;
use crate::events::{AppEvent, EventBus};
use crate::state::session::Session;

pub const LOGIN_PATH: &str = "/login";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP client itself could not be configured.
    #[error("http client build failed: {0}")]
    ClientBuild(String),

    /// The server answered with a non-2xx status.
    #[error("request failed with status {status}")]
    Status { status: u16, body: Value },

    /// The request went out but nothing came back (connect, timeout, reset).
    #[error("no response received: {0}")]
    NoResponse(String),

    /// The request could not be built or sent at all.
    #[error("request could not be constructed: {0}")]
    Construction(String),

    /// A 2xx body did not have the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),
}

impl GatewayError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    /// Human-readable `detail` from a structured error body.
    ///
    /// String details are returned verbatim; other non-null details are
    /// rendered as JSON. Empty strings count as absent.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };
        match body.get("detail")? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

// =============================================================================
// REQUEST
// =============================================================================

/// A call relative to the configured base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub payload: Payload,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), payload: Payload::Empty }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self::new(Method::POST, path).payload(payload)
    }

    #[must_use]
    pub fn put(path: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Self::new(Method::PUT, path).payload(payload)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = payload.into();
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

/// Percent-encode one path segment so ids cannot alter the request path.
#[must_use]
pub fn path_segment(raw: &str) -> String {
    // byte_serialize writes spaces as '+' and escapes literal '+', so every
    // remaining '+' was a space.
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

// =============================================================================
// GATEWAY
// =============================================================================

#[derive(Clone)]
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
    events: EventBus,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl Gateway {
    /// # Errors
    ///
    /// Returns [`GatewayError::ClientBuild`] if the TLS backend or client
    /// settings cannot be initialised.
    pub fn new(config: &ClientConfig, session: Arc<Session>, events: EventBus) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::ClientBuild(e.to_string()))?;

        Ok(Self { http, base_url: config.api_base_url.trim_end_matches('/').to_owned(), session, events })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and return the response body as JSON.
    ///
    /// An empty body yields `Value::Null`; a non-JSON body yields it as a
    /// JSON string.
    ///
    /// # Errors
    ///
    /// Returns the classified transport or status error.
    pub async fn send(&self, request: ApiRequest) -> Result<Value, GatewayError> {
        let response = self.dispatch(request).await?;
        let bytes = response.bytes().await.map_err(|e| Self::on_transport_error(&e))?;
        Ok(body_to_value(&bytes))
    }

    /// Send a request and decode the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Decode`] when the body does not match `T`.
    pub async fn send_as<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, GatewayError> {
        let value = self.send(request).await?;
        serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Send a request whose response is binary (file downloads).
    ///
    /// # Errors
    ///
    /// Returns the classified transport or status error.
    pub async fn send_bytes(&self, request: ApiRequest) -> Result<Vec<u8>, GatewayError> {
        let response = self.dispatch(request).await?;
        let bytes = response.bytes().await.map_err(|e| Self::on_transport_error(&e))?;
        Ok(bytes.to_vec())
    }

    pub async fn get(&self, path: &str) -> Result<Value, GatewayError> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post(&self, path: &str, payload: impl Into<Payload>) -> Result<Value, GatewayError> {
        self.send(ApiRequest::post(path, payload)).await
    }

    pub async fn put(&self, path: &str, payload: impl Into<Payload>) -> Result<Value, GatewayError> {
        self.send(ApiRequest::put(path, payload)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, GatewayError> {
        self.send(ApiRequest::delete(path)).await
    }

    async fn dispatch(&self, request: ApiRequest) -> Result<reqwest::Response, GatewayError> {
        let builder = self.prepare(request).map_err(|e| Self::on_construction_error(&e))?;

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => return Err(Self::on_construction_error(&e)),
            Err(e) => return Err(Self::on_transport_error(&e)),
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.bytes().await {
            Ok(bytes) => body_to_value(&bytes),
            Err(e) => {
                tracing::debug!(error = %e, "failed to read error body");
                Value::Null
            }
        };
        Err(self.on_status_error(status, body))
    }

    /// Request interceptor: URL, query, body and the stored credential.
    fn prepare(&self, request: ApiRequest) -> Result<reqwest::RequestBuilder, reqwest::Error> {
        let ApiRequest { method, path, query, payload } = request;
        let mut builder = self.http.request(method, self.endpoint(&path));
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(token) = self.session.stored_token() {
            builder = builder.header(AUTHORIZATION, token);
        }
        builder = match payload {
            Payload::Empty => builder,
            Payload::Json(value) => builder.json(&value),
            Payload::Multipart(form) => builder.multipart(form.into_multipart()?),
        };
        Ok(builder)
    }

    // -------------------------------------------------------------------------
    // Response interceptor
    // -------------------------------------------------------------------------

    fn on_status_error(&self, status: StatusCode, body: Value) -> GatewayError {
        tracing::error!(status = status.as_u16(), body = %body, "api error");

        if status == StatusCode::UNAUTHORIZED && self.session.expire() {
            tracing::warn!("session rejected by backend; redirecting to login");
            self.events.emit(AppEvent::SessionExpired { redirect_to: LOGIN_PATH.to_owned() });
        }

        GatewayError::Status { status: status.as_u16(), body }
    }

    fn on_transport_error(error: &reqwest::Error) -> GatewayError {
        tracing::error!(error = %error, timeout = error.is_timeout(), "request got no response");
        GatewayError::NoResponse(error.to_string())
    }

    fn on_construction_error(error: &reqwest::Error) -> GatewayError {
        tracing::error!(error = %error, "request could not be constructed");
        GatewayError::Construction(error.to_string())
    }
}

fn body_to_value(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;
