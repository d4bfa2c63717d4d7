//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use offline_worker::cache::storage::{new_shared_storage, SharedStorage};
use offline_worker::config::Config;
use offline_worker::net::memory::MemoryNetwork;
use offline_worker::net::request::{Destination, Request};
use offline_worker::ServiceWorker;
use url::Url;

pub const ORIGIN: &str = "http://site.test";

pub fn config(static_assets: &[&str], dynamic_assets: &[&str]) -> Arc<Config> {
    let mut cfg = Config::default();
    cfg.server.origin = ORIGIN.to_string();
    cfg.worker.static_assets = static_assets.iter().map(|s| s.to_string()).collect();
    cfg.worker.dynamic_assets = dynamic_assets.iter().map(|s| s.to_string()).collect();
    Arc::new(cfg)
}

pub fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

pub fn request(path: &str, destination: Destination) -> Request {
    Request::get(Url::parse(&url(path)).unwrap()).with_destination(destination)
}

pub fn worker(
    config: Arc<Config>,
    network: Arc<MemoryNetwork>,
    storage: SharedStorage,
) -> ServiceWorker {
    ServiceWorker::new(config, storage, network)
}

/// A worker over fresh storage, installed and activated.
pub async fn active_worker(
    static_assets: &[&str],
    network: Arc<MemoryNetwork>,
) -> ServiceWorker {
    let w = worker(config(static_assets, &[]), network, new_shared_storage());
    w.install().await.expect("install failed");
    w.activate().await.expect("activate failed");
    w
}
