//! Request classification and caching strategies.
//!
//! Every intercepted request gets exactly one strategy, first match wins:
//!
//! | # | Matches                         | Strategy      |
//! |---|---------------------------------|---------------|
//! | 1 | path on a pinned asset list     | cache-first   |
//! | 2 | destination `document`          | network-first |
//! | 3 | destination `image`             | cache-first   |
//! | 4 | anything else                   | network-first |
//!
//! Successful (200) network responses are stored in the dynamic partition
//! before they are returned.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::net::request::{Destination, Request, Response};
use crate::worker::ServiceWorker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    PinnedCacheFirst,
    DocumentNetworkFirst,
    ImageCacheFirst,
    NetworkFirst,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::PinnedCacheFirst => "pinned_cache_first",
            Strategy::DocumentNetworkFirst => "document_network_first",
            Strategy::ImageCacheFirst => "image_cache_first",
            Strategy::NetworkFirst => "network_first",
        }
    }

    pub fn is_cache_first(&self) -> bool {
        matches!(self, Strategy::PinnedCacheFirst | Strategy::ImageCacheFirst)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
        }
    }
}

/// The answer to a fetch event.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub response: Response,
    pub source: ResponseSource,
    pub strategy: Strategy,
}

/// Pick the strategy for `request`.
pub fn classify(config: &WorkerConfig, request: &Request) -> Strategy {
    if config.is_pinned(request.path()) {
        Strategy::PinnedCacheFirst
    } else if request.destination == Destination::Document {
        Strategy::DocumentNetworkFirst
    } else if request.destination == Destination::Image {
        Strategy::ImageCacheFirst
    } else {
        Strategy::NetworkFirst
    }
}

impl ServiceWorker {
    /// Answer a fetch event.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome> {
        let strategy = classify(&self.config().worker, request);
        debug!(
            url = %request.url,
            destination = %request.destination,
            strategy = %strategy,
            "Handling fetch"
        );

        let (response, source) = if strategy.is_cache_first() {
            self.cache_first(request).await?
        } else {
            self.network_first(request).await?
        };

        Ok(FetchOutcome {
            response,
            source,
            strategy,
        })
    }

    async fn cache_first(&self, request: &Request) -> Result<(Response, ResponseSource)> {
        if let Some(cached) = self.storage().match_request(request).await {
            debug!(url = %request.url, "Serving from cache");
            return Ok((cached, ResponseSource::Cache));
        }

        let response = self.network().fetch(request).await?;
        self.store_dynamic(request, &response).await;
        Ok((response, ResponseSource::Network))
    }

    async fn network_first(&self, request: &Request) -> Result<(Response, ResponseSource)> {
        match self.network().fetch(request).await {
            Ok(response) => {
                self.store_dynamic(request, &response).await;
                Ok((response, ResponseSource::Network))
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "Network failed, falling back to cache");
                match self.storage().match_request(request).await {
                    Some(cached) => Ok((cached, ResponseSource::Cache)),
                    None => Err(WorkerError::NoResponse(request.url.to_string())),
                }
            }
        }
    }

    /// Store a copy of a 200 response in the dynamic partition. Never fails
    /// the fetch.
    async fn store_dynamic(&self, request: &Request, response: &Response) {
        if !response.is_cacheable() {
            return;
        }
        let name = self.config().worker.dynamic_cache_name();
        if self.storage().put(&name, request, response.clone()).await {
            debug!(url = %request.url, partition = %name, "Stored response");
        } else {
            debug!(url = %request.url, method = %request.method, "Response not cacheable by method");
        }
    }
}
