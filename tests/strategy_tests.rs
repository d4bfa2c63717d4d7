//! Integration tests for fetch strategies.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{active_worker, request, url};
use offline_worker::cache::storage::new_shared_storage;
use offline_worker::net::memory::MemoryNetwork;
use offline_worker::net::request::{Destination, Response};
use offline_worker::worker::strategy::{ResponseSource, Strategy};
use offline_worker::WorkerError;

#[tokio::test]
async fn test_pinned_hit_skips_network() {
    let net = Arc::new(MemoryNetwork::new().with_route(&url("/logo.png"), Response::ok("logo")));
    let worker = active_worker(&["/logo.png"], net.clone()).await;
    let calls_after_install = net.call_count();

    let outcome = worker
        .handle_fetch(&request("/logo.png", Destination::Image))
        .await
        .unwrap();

    assert_eq!(outcome.strategy, Strategy::PinnedCacheFirst);
    assert_eq!(outcome.source, ResponseSource::Cache);
    assert_eq!(outcome.response.body, "logo");
    assert_eq!(net.call_count(), calls_after_install);
}

#[tokio::test]
async fn test_image_fetched_once_then_cached() {
    let net = Arc::new(MemoryNetwork::new().with_route(&url("/photo.jpg"), Response::ok("jpg")));
    let worker = active_worker(&[], net.clone()).await;

    let first = worker
        .handle_fetch(&request("/photo.jpg", Destination::Image))
        .await
        .unwrap();
    assert_eq!(first.strategy, Strategy::ImageCacheFirst);
    assert_eq!(first.source, ResponseSource::Network);

    let second = worker
        .handle_fetch(&request("/photo.jpg", Destination::Image))
        .await
        .unwrap();
    assert_eq!(second.source, ResponseSource::Cache);
    assert_eq!(second.response.body, "jpg");
    assert_eq!(net.calls(), vec![url("/photo.jpg")]);

    // Stored in the dynamic partition.
    let dynamic = worker.config().worker.dynamic_cache_name();
    assert!(worker
        .storage()
        .match_in(&dynamic, &request("/photo.jpg", Destination::Image))
        .await
        .is_some());
}

#[tokio::test]
async fn test_pinned_miss_fetches_and_stores() {
    // Pinned but absent from the cache: fetched, then cached.
    let net = Arc::new(MemoryNetwork::new().with_route(&url("/a.png"), Response::ok("a")));
    let worker = common::worker(
        common::config(&[], &["/a.png"]),
        net.clone(),
        new_shared_storage(),
    );

    let first = worker
        .handle_fetch(&request("/a.png", Destination::Other))
        .await
        .unwrap();
    assert_eq!(first.strategy, Strategy::PinnedCacheFirst);
    assert_eq!(first.source, ResponseSource::Network);

    let second = worker
        .handle_fetch(&request("/a.png", Destination::Other))
        .await
        .unwrap();
    assert_eq!(second.source, ResponseSource::Cache);
    assert_eq!(net.call_count(), 1);
}

#[tokio::test]
async fn test_cache_first_miss_offline_fails() {
    let net = Arc::new(MemoryNetwork::new());
    let worker = active_worker(&[], net.clone()).await;
    net.set_offline(true);

    let err = worker
        .handle_fetch(&request("/nope.png", Destination::Image))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Fetch(_)));
}

#[tokio::test]
async fn test_document_always_tries_network_first() {
    let net = Arc::new(MemoryNetwork::new().with_route(&url("/page.html"), Response::ok("v1")));
    let worker = active_worker(&[], net.clone()).await;
    let doc = request("/page.html", Destination::Document);

    let first = worker.handle_fetch(&doc).await.unwrap();
    assert_eq!(first.strategy, Strategy::DocumentNetworkFirst);
    assert_eq!(first.source, ResponseSource::Network);

    // Fresh content wins while online, even though a cached copy exists.
    net.route(&url("/page.html"), Response::ok("v2"));
    let second = worker.handle_fetch(&doc).await.unwrap();
    assert_eq!(second.source, ResponseSource::Network);
    assert_eq!(second.response.body, "v2");
    assert_eq!(net.call_count(), 2);

    net.set_offline(true);
    let offline = worker.handle_fetch(&doc).await.unwrap();
    assert_eq!(offline.source, ResponseSource::Cache);
    assert_eq!(offline.response.body, "v2");
    assert_eq!(net.call_count(), 3);
}

#[tokio::test]
async fn test_document_offline_without_cache_fails() {
    let net = Arc::new(MemoryNetwork::new());
    let worker = active_worker(&[], net.clone()).await;
    net.set_offline(true);

    let err = worker
        .handle_fetch(&request("/never-seen.html", Destination::Document))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::NoResponse(_)));
}

#[tokio::test]
async fn test_default_strategy_skips_non_200() {
    let net = Arc::new(MemoryNetwork::new().with_route(
        &url("/api/data.json"),
        Response::new(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
    ));
    let worker = active_worker(&[], net.clone()).await;
    let req = request("/api/data.json", Destination::Other);

    let outcome = worker.handle_fetch(&req).await.unwrap();
    assert_eq!(outcome.strategy, Strategy::NetworkFirst);
    assert_eq!(outcome.response.status, StatusCode::INTERNAL_SERVER_ERROR);

    net.set_offline(true);
    assert!(worker.handle_fetch(&req).await.is_err());
}

#[tokio::test]
async fn test_non_get_is_never_cached() {
    let net = Arc::new(MemoryNetwork::new().with_route(&url("/submit"), Response::ok("thanks")));
    let worker = active_worker(&[], net.clone()).await;
    let post = request("/submit", Destination::Other).with_method(Method::POST);

    let outcome = worker.handle_fetch(&post).await.unwrap();
    assert_eq!(outcome.source, ResponseSource::Network);

    net.set_offline(true);
    assert!(matches!(
        worker.handle_fetch(&post).await,
        Err(WorkerError::NoResponse(_))
    ));
}
