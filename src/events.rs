//! Cross-component application events.
//!
//! DESIGN
//! ======
//! Components that need to reach the application shell (the gateway after a
//! 401, the navigation guard when it blocks a page) publish on a shared
//! broadcast bus instead of reloading or touching the shell directly. The
//! shell subscribes once and decides how to react.

use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Short user-facing message shown near the triggering action.
    Notice { level: NoticeLevel, message: String },
    /// The backend rejected the session; the shell should route to `redirect_to`.
    SessionExpired { redirect_to: String },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn emit(&self, event: AppEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("app event dropped: no subscribers");
        }
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(AppEvent::Notice { level: NoticeLevel::Warning, message: message.into() });
    }
}

#[cfg(test)]
#[path = "events_test.rs"]
mod tests;
