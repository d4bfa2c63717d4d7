//! Single entry point for hosts that deliver events as values.

use bytes::Bytes;

use crate::error::Result;
use crate::net::request::Request;
use crate::worker::message::{ControlMessage, ReplyPort};
use crate::worker::push::Notification;
use crate::worker::strategy::FetchOutcome;
use crate::worker::ServiceWorker;

/// An event delivered by the host.
#[derive(Debug)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Message {
        data: serde_json::Value,
        reply: Option<ReplyPort>,
    },
    Push(Option<Bytes>),
    NotificationClick {
        notification_id: String,
        action: Option<String>,
    },
}

impl Event {
    /// Event name as the host platform spells it.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Install => "install",
            Event::Activate => "activate",
            Event::Fetch(_) => "fetch",
            Event::Message { .. } => "message",
            Event::Push(_) => "push",
            Event::NotificationClick { .. } => "notificationclick",
        }
    }
}

/// What handling an event produced.
#[derive(Debug)]
pub enum EventOutcome {
    Installed,
    /// Names of the stale partitions removed.
    Activated(Vec<String>),
    Fetched(FetchOutcome),
    Message(Option<ControlMessage>),
    Pushed(Option<Notification>),
    /// Path opened by the click, if any.
    NotificationClicked(Option<String>),
}

impl ServiceWorker {
    /// Route `event` to its handler. The host awaits the returned future
    /// before moving the worker to its next lifecycle phase.
    pub async fn dispatch(&self, event: Event) -> Result<EventOutcome> {
        tracing::trace!(event = event.name(), "Dispatching event");
        match event {
            Event::Install => self.install().await.map(|()| EventOutcome::Installed),
            Event::Activate => self.activate().await.map(EventOutcome::Activated),
            Event::Fetch(request) => self.handle_fetch(&request).await.map(EventOutcome::Fetched),
            Event::Message { data, reply } => {
                Ok(EventOutcome::Message(self.handle_message(&data, reply)))
            }
            Event::Push(payload) => self
                .handle_push(payload.as_deref())
                .await
                .map(EventOutcome::Pushed),
            Event::NotificationClick {
                notification_id,
                action,
            } => Ok(EventOutcome::NotificationClicked(
                self.handle_notification_click(&notification_id, action.as_deref())
                    .await,
            )),
        }
    }
}
