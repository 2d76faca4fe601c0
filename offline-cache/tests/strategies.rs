mod common;

use common::{config, url, FakeNetwork, RecordingHost};
use offline_cache::cache::{CacheStorage, MemoryStorage, RequestKey};
use offline_cache::{Request, ServiceWorker};
use std::sync::Arc;
use std::time::Duration;

async fn active_worker(network: &Arc<FakeNetwork>, storage: &Arc<MemoryStorage>) -> ServiceWorker {
    network.respond("/", 200, "home");
    network.respond("/favicon.svg", 200, "<svg/>");
    let worker = ServiceWorker::builder(config("v1", &["/", "/favicon.svg"]))
        .backend(network.clone())
        .storage(storage.clone())
        .host(Arc::new(RecordingHost::default()))
        .finish()
        .unwrap();
    worker.install().await.unwrap();
    worker.activate().await.unwrap();
    worker
}

async fn body(worker: &ServiceWorker, path: &str) -> (u16, String) {
    let resp = worker.fetch(Request::get(url(path))).await.unwrap();
    (resp.get_status().as_u16(), resp.into_body_str())
}

#[tokio::test]
async fn install_stores_exactly_the_manifest() {
    let network = FakeNetwork::new();
    let storage = Arc::new(MemoryStorage::new());
    let worker = active_worker(&network, &storage).await;

    let generation = worker.repository().static_generation().await.unwrap();
    let mut keys: Vec<String> = generation
        .keys()
        .await
        .unwrap()
        .iter()
        .map(|key| key.url().to_string())
        .collect();
    keys.sort();
    assert_eq!(keys, vec![url("/"), url("/favicon.svg")]);
}

#[tokio::test]
async fn static_asset_is_cached_on_first_fetch_and_served_from_cache_after() {
    let network = FakeNetwork::new();
    let storage = Arc::new(MemoryStorage::new());
    let worker = active_worker(&network, &storage).await;

    network.respond("/assets/logo.svg", 200, "X");
    assert_eq!(body(&worker, "/assets/logo.svg").await, (200, "X".to_owned()));
    let generation = worker.repository().static_generation().await.unwrap();
    let key = RequestKey::get(url("/assets/logo.svg").parse().unwrap());
    let stored = generation.lookup(&key).await.unwrap().unwrap();
    assert_eq!(stored.body().as_ref(), b"X");

    network.respond("/assets/logo.svg", 500, "server error");
    let calls = network.calls_to("/assets/logo.svg");
    assert_eq!(body(&worker, "/assets/logo.svg").await, (200, "X".to_owned()));
    assert_eq!(network.calls_to("/assets/logo.svg"), calls);
}

#[tokio::test]
async fn api_request_offline_with_empty_cache_is_503() {
    let network = FakeNetwork::new();
    let storage = Arc::new(MemoryStorage::new());
    let worker = active_worker(&network, &storage).await;

    network.fail("/api/data");
    let (status, text) = body(&worker, "/api/data").await;
    assert_eq!(status, 503);
    assert_eq!(text, "Offline content not available");
}

#[tokio::test]
async fn api_request_offline_falls_back_to_last_good_response() {
    let network = FakeNetwork::new();
    let storage = Arc::new(MemoryStorage::new());
    let worker = active_worker(&network, &storage).await;

    network.respond("/api/data", 200, r#"{"n":1}"#);
    assert_eq!(body(&worker, "/api/data").await, (200, r#"{"n":1}"#.to_owned()));
    network.respond("/api/data", 200, r#"{"n":2}"#);
    assert_eq!(body(&worker, "/api/data").await, (200, r#"{"n":2}"#.to_owned()));
    network.fail("/api/data");
    assert_eq!(body(&worker, "/api/data").await, (200, r#"{"n":2}"#.to_owned()));
}

#[tokio::test]
async fn failed_responses_are_never_cached() {
    let network = FakeNetwork::new();
    let storage = Arc::new(MemoryStorage::new());
    let worker = active_worker(&network, &storage).await;
    let static_before = worker.repository().static_generation().await.unwrap().len().await.unwrap();

    network.respond("/assets/missing.png", 404, "nope");
    network.respond("/api/broken", 500, "boom");
    network.respond("/contact", 502, "bad gateway");
    for path in ["/assets/missing.png", "/api/broken", "/contact"] {
        let (status, _) = body(&worker, path).await;
        assert!(status >= 400);
    }
    worker.settled().await;

    let repo = worker.repository();
    assert_eq!(repo.static_generation().await.unwrap().len().await.unwrap(), static_before);
    assert_eq!(repo.dynamic_generation().await.unwrap().len().await.unwrap(), 0);
}

#[tokio::test]
async fn stale_while_revalidate_answers_without_waiting_for_the_network() {
    let network = FakeNetwork::new();
    let storage = Arc::new(MemoryStorage::new());
    let worker = active_worker(&network, &storage).await;

    network.respond("/about", 200, "old");
    assert_eq!(body(&worker, "/about").await, (200, "old".to_owned()));
    worker.settled().await;

    network.respond("/about", 200, "new");
    network.gate("/about");
    let served = tokio::time::timeout(Duration::from_secs(5), body(&worker, "/about"))
        .await
        .expect("cached page should not wait for the network");
    assert_eq!(served, (200, "old".to_owned()));

    network.release("/about");
    assert_eq!(worker.settled().await, 0);
    assert_eq!(body(&worker, "/about").await, (200, "new".to_owned()));
    worker.settled().await;
}

#[tokio::test]
async fn stale_while_revalidate_refetch_failure_is_swallowed() {
    let network = FakeNetwork::new();
    let storage = Arc::new(MemoryStorage::new());
    let worker = active_worker(&network, &storage).await;

    network.respond("/services", 200, "services");
    body(&worker, "/services").await;
    worker.settled().await;

    network.fail("/services");
    assert_eq!(body(&worker, "/services").await, (200, "services".to_owned()));
    assert_eq!(worker.settled().await, 0);
}

#[tokio::test]
async fn precached_home_page_serves_offline() {
    let network = FakeNetwork::new();
    let storage = Arc::new(MemoryStorage::new());
    let worker = active_worker(&network, &storage).await;

    network.fail("/");
    assert_eq!(body(&worker, "/").await, (200, "home".to_owned()));
    worker.settled().await;
}

#[tokio::test]
async fn non_get_requests_never_touch_the_cache() {
    let network = FakeNetwork::new();
    let storage = Arc::new(MemoryStorage::new());
    let worker = active_worker(&network, &storage).await;
    let dynamic = worker.repository().dynamic_generation().await.unwrap();
    let names_before = storage.keys().await.unwrap();

    network.respond("/api/contact", 200, "thanks");
    let resp = worker
        .fetch(Request::post(url("/api/contact")).with_body("name=Ada"))
        .await
        .unwrap();
    assert_eq!(resp.into_body_str(), "thanks");
    assert_eq!(storage.keys().await.unwrap(), names_before);
    assert_eq!(dynamic.len().await.unwrap(), 0);
}

#[tokio::test]
async fn cache_write_failures_still_return_the_network_response() {
    let network = FakeNetwork::new();
    network.respond("/", 200, "home");
    // room for the manifest and nothing else
    let storage = Arc::new(MemoryStorage::with_entry_limit(1));
    let worker = ServiceWorker::builder(config("v1", &["/"]))
        .backend(network.clone())
        .storage(storage.clone())
        .finish()
        .unwrap();
    worker.install().await.unwrap();
    worker.activate().await.unwrap();

    network.respond("/assets/a.js", 200, "a");
    network.respond("/assets/b.js", 200, "b");
    assert_eq!(body(&worker, "/assets/a.js").await, (200, "a".to_owned()));
    assert_eq!(body(&worker, "/assets/b.js").await, (200, "b".to_owned()));
    let generation = worker.repository().static_generation().await.unwrap();
    assert_eq!(generation.len().await.unwrap(), 1);
}
