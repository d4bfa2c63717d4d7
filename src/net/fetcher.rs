//! Network access for the worker.
//!
//! The worker only ever talks to the network through the [`Network`] trait so
//! the strategies can be driven against the real origin ([`HttpNetwork`]) or an
//! in-memory one ([`crate::net::memory::MemoryNetwork`]).

use std::time::Duration;

use async_trait::async_trait;
use axum::http::header;
use tracing::debug;

use crate::error::FetchError;
use crate::net::request::{Request, Response};

/// Something that can turn a request into a live response.
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetch `request` from the network.
    ///
    /// Any HTTP status counts as success; only a missing response is an error.
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

/// Headers that describe the hop to us, not the request to the origin.
const HOP_HEADERS: [header::HeaderName; 5] = [
    header::HOST,
    header::CONNECTION,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Forwards requests to the site origin with reqwest.
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    /// Create a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("offline-worker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let url = request.url.to_string();

        let mut headers = request.headers.clone();
        for name in &HOP_HEADERS {
            headers.remove(name);
        }

        let resp = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| map_reqwest_error(&url, e))?;

        let status = resp.status();
        let mut headers = resp.headers().clone();
        for name in &HOP_HEADERS {
            headers.remove(name);
        }
        let body = resp.bytes().await.map_err(|e| map_reqwest_error(&url, e))?;

        debug!(url, status = status.as_u16(), size = body.len(), "Fetched from origin");

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}
