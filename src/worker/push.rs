//! Push messages and notification clicks.
//!
//! A push carrying `{title, body}` becomes a notification with the configured
//! icon, badge, vibration pattern and two actions (`explore`, `close`).
//! Clicking `explore` opens the site root; anything else just dismisses.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::NotificationConfig;
use crate::error::Result;
use crate::worker::ServiceWorker;

pub const ACTION_EXPLORE: &str = "explore";
pub const ACTION_CLOSE: &str = "close";

/// Body of a push message.
#[derive(Debug, Clone, Deserialize)]
pub struct PushPayload {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch.
    pub date_of_arrival: u64,
    pub primary_key: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// A notification shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub options: NotificationOptions,
}

impl Notification {
    /// Build the notification for `payload` using the configured options.
    pub fn from_payload(payload: PushPayload, config: &NotificationConfig) -> Self {
        let date_of_arrival = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4().to_string(),
            title: payload.title,
            options: NotificationOptions {
                body: payload.body,
                icon: config.icon.clone(),
                badge: config.badge.clone(),
                vibrate: config.vibrate.clone(),
                data: NotificationData {
                    date_of_arrival,
                    primary_key: 1,
                },
                actions: vec![
                    NotificationAction {
                        action: ACTION_EXPLORE.to_string(),
                        title: config.explore_title.clone(),
                        icon: config.icon.clone(),
                    },
                    NotificationAction {
                        action: ACTION_CLOSE.to_string(),
                        title: config.close_title.clone(),
                        icon: config.icon.clone(),
                    },
                ],
            },
        }
    }
}

impl ServiceWorker {
    /// Handle a push. No payload, no notification.
    pub async fn handle_push(&self, payload: Option<&[u8]>) -> Result<Option<Notification>> {
        let Some(raw) = payload else {
            debug!("Push without payload ignored");
            return Ok(None);
        };
        let payload: PushPayload = serde_json::from_slice(raw)?;
        let notification = Notification::from_payload(payload, &self.config().notifications);
        self.notifier().show_notification(notification.clone()).await;
        Ok(Some(notification))
    }

    /// Handle a click on notification `id`. Returns the path opened, if any.
    pub async fn handle_notification_click(
        &self,
        id: &str,
        action: Option<&str>,
    ) -> Option<String> {
        self.notifier().close_notification(id).await;

        if action == Some(ACTION_EXPLORE) {
            let path = self.config().notifications.open_path.clone();
            self.clients().open_window(&path).await;
            Some(path)
        } else {
            debug!(id, ?action, "Notification dismissed");
            None
        }
    }
}
