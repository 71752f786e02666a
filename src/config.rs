//! Client configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Parsing is written against a lookup closure so tests can feed variables
//! without mutating the process environment. `from_env` is the thin wrapper
//! used by the binary.

use std::path::PathBuf;
use std::time::Duration;

use time::UtcOffset;
use time::macros::format_description;

pub const DEVELOPMENT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_APP_ORIGIN: &str = "http://localhost";
pub const API_PATH_PREFIX: &str = "/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown APP_ENV: {0} (expected 'production' or 'development')")]
    UnknownEnvironment(String),

    #[error("invalid {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Build/runtime environment that selects the API base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Production,
    #[default]
    Development,
}

impl Environment {
    fn parse(raw: Option<&str>) -> Result<Self, ConfigError> {
        match raw.map(str::trim).unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            other => Err(ConfigError::UnknownEnvironment(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub environment: Environment,
    /// Base URL every gateway path is appended to, without trailing slash.
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// File backing persisted session storage. `None` keeps it in memory.
    pub storage_path: Option<PathBuf>,
    /// Offset applied when rendering timestamps for display.
    pub display_offset: UtcOffset,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            api_base_url: DEVELOPMENT_API_BASE_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            storage_path: None,
            display_offset: UtcOffset::UTC,
        }
    }
}

impl ClientConfig {
    /// Build config from process environment variables.
    ///
    /// Optional:
    /// - `APP_ENV`: `development` (default) or `production`
    /// - `APP_ORIGIN`: origin used in production, default `http://localhost`
    /// - `API_BASE_URL`: overrides the computed base URL
    /// - `API_TIMEOUT_SECS`: default 30
    /// - `SESSION_STORE_PATH`: file for persisted session storage
    /// - `DISPLAY_UTC_OFFSET`: `+HH:MM`, default UTC
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = Environment::parse(lookup("APP_ENV").as_deref())?;

        let api_base_url = match lookup("API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            Some(url) => url.trim().trim_end_matches('/').to_owned(),
            None => default_base_url(environment, lookup("APP_ORIGIN").as_deref()),
        };

        let request_timeout = match lookup("API_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ConfigError::InvalidValue { var: "API_TIMEOUT_SECS", value: raw.clone() })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let storage_path = lookup("SESSION_STORE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let display_offset = match lookup("DISPLAY_UTC_OFFSET") {
            Some(raw) => parse_offset(&raw)?,
            None => UtcOffset::UTC,
        };

        Ok(Self { environment, api_base_url, request_timeout, storage_path, display_offset })
    }
}

/// Production talks to `/api` on the serving origin; development talks to the
/// local backend directly.
#[must_use]
pub fn default_base_url(environment: Environment, origin: Option<&str>) -> String {
    match environment {
        Environment::Production => {
            let origin = origin.unwrap_or(DEFAULT_APP_ORIGIN).trim().trim_end_matches('/');
            format!("{origin}{API_PATH_PREFIX}")
        }
        Environment::Development => DEVELOPMENT_API_BASE_URL.to_owned(),
    }
}

fn parse_offset(raw: &str) -> Result<UtcOffset, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return Ok(UtcOffset::UTC);
    }
    UtcOffset::parse(trimmed, format_description!("[offset_hour sign:mandatory]:[offset_minute]"))
        .map_err(|_| ConfigError::InvalidValue { var: "DISPLAY_UTC_OFFSET", value: raw.to_owned() })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
