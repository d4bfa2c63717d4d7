//! In-memory origin.
//!
//! Serves a fixed set of responses keyed by URL and records every fetch, so
//! callers can check whether (and how often) the network was touched. Can be
//! switched offline to simulate an unreachable origin.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::http::StatusCode;

use crate::error::FetchError;
use crate::net::fetcher::Network;
use crate::net::request::{Request, Response};

#[derive(Default)]
pub struct MemoryNetwork {
    routes: Mutex<HashMap<String, Response>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `url`.
    pub fn route(&self, url: &str, response: Response) {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.to_string(), response);
    }

    /// Builder form of [`MemoryNetwork::route`].
    pub fn with_route(self, url: &str, response: Response) -> Self {
        self.route(url, response);
        self
    }

    /// While offline every fetch fails with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// URLs fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Network for MemoryNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let url = request.url.to_string();
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(FetchError::Network {
                url,
                reason: "origin offline".to_string(),
            });
        }

        let routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        Ok(routes
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Response::new(StatusCode::NOT_FOUND, "not found")))
    }
}
