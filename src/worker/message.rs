//! Control messages posted by pages.
//!
//! `{"type": "SKIP_WAITING"}` activates the worker without waiting;
//! `{"type": "GET_VERSION"}` replies `{"version": "1.0.0"}` on the reply port.
//! Anything else is ignored.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::worker::ServiceWorker;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    SkipWaiting,
    GetVersion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReply {
    pub version: String,
}

/// Version reported to pages. Independent of the cache tag in
/// `worker.version`, which only names partitions.
pub const WORKER_VERSION: &str = "1.0.0";

/// Channel a message reply is posted to.
pub type ReplyPort = oneshot::Sender<serde_json::Value>;

impl ServiceWorker {
    /// Handle one message. Returns the recognised message, if any.
    pub fn handle_message(
        &self,
        data: &serde_json::Value,
        reply: Option<ReplyPort>,
    ) -> Option<ControlMessage> {
        let message = match ControlMessage::deserialize(data) {
            Ok(message) => message,
            Err(e) => {
                debug!(error = %e, "Ignoring unrecognised message");
                return None;
            }
        };

        match message {
            ControlMessage::SkipWaiting => self.skip_waiting(),
            ControlMessage::GetVersion => {
                let version = VersionReply {
                    version: WORKER_VERSION.to_string(),
                };
                match (reply, serde_json::to_value(&version)) {
                    (Some(port), Ok(value)) => {
                        if port.send(value).is_err() {
                            debug!("Version reply port closed");
                        }
                    }
                    (None, _) => warn!("GET_VERSION without a reply port"),
                    (_, Err(e)) => warn!(error = %e, "Could not encode version reply"),
                }
            }
        }

        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::cache::storage::new_shared_storage;
    use crate::config::Config;
    use crate::net::memory::MemoryNetwork;

    fn worker() -> ServiceWorker {
        ServiceWorker::new(
            Arc::new(Config::default()),
            new_shared_storage(),
            Arc::new(MemoryNetwork::new()),
        )
    }

    #[tokio::test]
    async fn test_get_version_replies() {
        let worker = worker();
        let (tx, rx) = oneshot::channel();

        let handled = worker.handle_message(&json!({"type": "GET_VERSION"}), Some(tx));

        assert_eq!(handled, Some(ControlMessage::GetVersion));
        assert_eq!(rx.await.unwrap(), json!({"version": "1.0.0"}));
    }

    #[tokio::test]
    async fn test_version_reply_ignores_cache_tag() {
        let mut config = Config::default();
        config.worker.version = "2.0.0".to_string();
        let worker = ServiceWorker::new(
            Arc::new(config),
            new_shared_storage(),
            Arc::new(MemoryNetwork::new()),
        );
        let (tx, rx) = oneshot::channel();

        worker.handle_message(&json!({"type": "GET_VERSION"}), Some(tx));

        assert_eq!(rx.await.unwrap(), json!({"version": "1.0.0"}));
    }

    #[test]
    fn test_skip_waiting() {
        let worker = worker();
        assert!(!worker.skip_waiting_requested());
        worker.handle_message(&json!({"type": "SKIP_WAITING"}), None);
        assert!(worker.skip_waiting_requested());
    }

    #[test]
    fn test_unknown_messages_ignored() {
        let worker = worker();
        assert!(worker.handle_message(&json!({"type": "CLEAR"}), None).is_none());
        assert!(worker.handle_message(&json!("SKIP_WAITING"), None).is_none());
        assert!(!worker.skip_waiting_requested());
    }
}
