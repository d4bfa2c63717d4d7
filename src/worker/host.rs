//! Host-side effects the worker asks for but does not perform itself.
//!
//! - [`Clients`]: claiming open pages and opening new ones
//! - [`Notifier`]: showing and closing notifications
//!
//! The in-memory implementations record every call; the HTTP host exposes
//! those records so a front end can poll them.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;

use crate::worker::push::Notification;

/// Pages controlled by the worker.
#[async_trait]
pub trait Clients: Send + Sync {
    /// Take control of already-open pages without a reload.
    async fn claim(&self);

    /// Open `path` in a new page, or focus an existing one.
    async fn open_window(&self, path: &str);
}

/// Visible notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show_notification(&self, notification: Notification);

    /// Dismiss a notification. Unknown ids are ignored.
    async fn close_notification(&self, id: &str);
}

/// Records claims and opened windows.
#[derive(Default)]
pub struct ClientRegistry {
    claims: Mutex<usize>,
    opened: Mutex<Vec<String>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim_count(&self) -> usize {
        *self.claims.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Paths opened so far, oldest first.
    pub fn opened_windows(&self) -> Vec<String> {
        self.opened.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Clients for ClientRegistry {
    async fn claim(&self) {
        *self.claims.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        info!("Claimed open clients");
    }

    async fn open_window(&self, path: &str) {
        self.opened
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
        info!(path, "Opened window");
    }
}

/// Keeps currently visible notifications.
#[derive(Default)]
pub struct NotificationCenter {
    visible: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(&self) -> Vec<Notification> {
        self.visible.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Notifier for NotificationCenter {
    async fn show_notification(&self, notification: Notification) {
        info!(id = %notification.id, title = notification.title, "Showing notification");
        self.visible
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }

    async fn close_notification(&self, id: &str) {
        self.visible
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|n| n.id != id);
    }
}
