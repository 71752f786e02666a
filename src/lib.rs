//! Client core for the software engineering course assistant.
//!
//! Session state with persisted login, a single HTTP gateway with request
//! and response interception, client-side routing with an authentication
//! guard, and the date helpers used to render backend timestamps.

pub mod app;
pub mod config;
pub mod events;
pub mod net;
pub mod router;
pub mod state;
pub mod storage;
pub mod util;

#[cfg(test)]
mod test_support;

pub use app::{App, AppError};
pub use config::ClientConfig;
