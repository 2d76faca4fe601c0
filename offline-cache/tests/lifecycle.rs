mod common;

use common::{config, url, FakeNetwork, RecordingHost};
use offline_cache::cache::{CacheStorage, MemoryStorage};
use offline_cache::config::WorkerConfig;
use offline_cache::error::RegisterError;
use offline_cache::lifecycle::WorkerState;
use offline_cache::{Registration, Request, ServiceWorker};
use std::sync::Arc;

fn build(
    config: WorkerConfig,
    network: &Arc<FakeNetwork>,
    storage: &Arc<MemoryStorage>,
) -> ServiceWorker {
    ServiceWorker::builder(config)
        .backend(network.clone())
        .storage(storage.clone())
        .host(Arc::new(RecordingHost::default()))
        .finish()
        .unwrap()
}

fn site() -> Arc<FakeNetwork> {
    let network = FakeNetwork::new();
    network.respond("/", 200, "home");
    network.respond("/favicon.svg", 200, "<svg/>");
    network
}

#[tokio::test]
async fn activation_leaves_only_the_current_generations() {
    let network = site();
    let storage = Arc::new(MemoryStorage::new());
    for name in ["ovid-international-v1", "static-v0.9.0", "dynamic-v0.9.0"] {
        storage.open(name).await.unwrap();
    }

    let worker = build(config("v1.0.0", &["/", "/favicon.svg"]), &network, &storage);
    worker.install().await.unwrap();
    worker.repository().dynamic_generation().await.unwrap();
    let mut evicted = worker.activate().await.unwrap();
    evicted.sort();

    assert_eq!(
        evicted,
        vec!["dynamic-v0.9.0", "ovid-international-v1", "static-v0.9.0"]
    );
    assert_eq!(
        storage.keys().await.unwrap(),
        vec!["dynamic-v1.0.0", "static-v1.0.0"]
    );
}

#[tokio::test]
async fn prefixed_generation_names() {
    let network = site();
    let storage = Arc::new(MemoryStorage::new());
    let worker = build(
        WorkerConfig {
            cache_prefix: Some("ovid".into()),
            ..config("v3", &["/"])
        },
        &network,
        &storage,
    );
    worker.install().await.unwrap();
    worker.activate().await.unwrap();
    assert_eq!(storage.keys().await.unwrap(), vec!["ovid-static-v3"]);
}

#[tokio::test]
async fn failed_install_keeps_the_previous_worker_in_control() {
    let network = site();
    let storage = Arc::new(MemoryStorage::new());
    let mut registration = Registration::new(network.clone());
    let state = registration
        .register(build(config("v1", &["/", "/favicon.svg"]), &network, &storage))
        .await
        .unwrap();
    assert_eq!(state, WorkerState::Activated);

    network.fail("/assets/ovid-logo2.svg");
    let broken = build(
        config("v2", &["/", "/assets/ovid-logo2.svg"]),
        &network,
        &storage,
    );
    match registration.register(broken).await {
        Err(RegisterError::Install(_)) => {}
        x => panic!("unexpected result: {:?}", x),
    }

    let active = registration.active().unwrap();
    assert_eq!(active.config().version, "v1");
    assert_eq!(active.state(), WorkerState::Activated);
    assert!(!registration.update_available());
    // the half-installed generation never received anything
    let v2 = storage.open("static-v2").await.unwrap();
    assert_eq!(v2.len().await.unwrap(), 0);

    network.fail("/");
    let resp = registration.fetch(Request::get(url("/"))).await.unwrap();
    assert_eq!(resp.into_body_str(), "home");
    registration.settled().await;
}

#[tokio::test]
async fn waiting_worker_takes_over_on_skip_waiting() {
    let network = site();
    let storage = Arc::new(MemoryStorage::new());
    let mut registration = Registration::new(network.clone());
    registration
        .register(build(config("v1", &["/"]), &network, &storage))
        .await
        .unwrap();

    let patient = WorkerConfig {
        skip_waiting_on_install: false,
        ..config("v2", &["/"])
    };
    let state = registration
        .register(build(patient, &network, &storage))
        .await
        .unwrap();
    assert_eq!(state, WorkerState::Installed);
    assert!(registration.update_available());
    assert_eq!(registration.active().unwrap().config().version, "v1");
    // both versions' generations coexist until activation
    assert!(storage.has("static-v1").await.unwrap());
    assert!(storage.has("static-v2").await.unwrap());

    assert!(registration.skip_waiting().await.unwrap());
    assert!(!registration.update_available());
    let active = registration.active().unwrap();
    assert_eq!(active.config().version, "v2");
    assert!(active.skip_waiting_requested());
    assert_eq!(storage.keys().await.unwrap(), vec!["static-v2"]);
    assert!(!registration.skip_waiting().await.unwrap());
}

#[tokio::test]
async fn skip_waiting_on_install_activates_immediately() {
    let network = site();
    let storage = Arc::new(MemoryStorage::new());
    let mut registration = Registration::new(network.clone());
    registration
        .register(build(config("v1", &["/"]), &network, &storage))
        .await
        .unwrap();
    let state = registration
        .register(build(config("v2", &["/"]), &network, &storage))
        .await
        .unwrap();
    assert_eq!(state, WorkerState::Activated);
    assert_eq!(registration.active().unwrap().config().version, "v2");
    assert!(!storage.has("static-v1").await.unwrap());
}

#[tokio::test]
async fn without_a_worker_requests_go_to_the_network() {
    let network = site();
    let registration = Registration::new(network.clone());
    let resp = registration.fetch(Request::get(url("/"))).await.unwrap();
    assert_eq!(resp.into_body_str(), "home");
    network.fail("/");
    assert!(registration.fetch(Request::get(url("/"))).await.is_err());
}

async fn v1_active_v2_waiting(
    network: &Arc<FakeNetwork>,
    storage: &Arc<MemoryStorage>,
) -> Registration {
    let mut registration = Registration::new(network.clone());
    registration
        .register(build(config("v1", &["/"]), network, storage))
        .await
        .unwrap();
    let patient = WorkerConfig {
        skip_waiting_on_install: false,
        ..config("v2", &["/"])
    };
    registration
        .register(build(patient, network, storage))
        .await
        .unwrap();
    assert!(registration.update_available());
    registration
}

#[tokio::test]
async fn skip_waiting_message_to_the_waiting_worker_hands_over_control() {
    let network = site();
    let storage = Arc::new(MemoryStorage::new());
    let mut registration = v1_active_v2_waiting(&network, &storage).await;

    let waiting = registration.waiting().unwrap();
    assert!(waiting
        .post_message(r#"{"type":"SKIP_WAITING"}"#)
        .await
        .is_empty());
    assert!(registration.refresh().await.unwrap());

    assert!(!registration.update_available());
    let active = registration.active().unwrap();
    assert_eq!(active.config().version, "v2");
    assert_eq!(active.state(), WorkerState::Activated);
    assert_eq!(storage.keys().await.unwrap(), vec!["static-v2"]);
    assert!(!registration.refresh().await.unwrap());
}

#[tokio::test]
async fn messages_posted_through_the_registration_reach_the_waiting_worker() {
    let network = site();
    let storage = Arc::new(MemoryStorage::new());
    let mut registration = v1_active_v2_waiting(&network, &storage).await;

    let failures = registration
        .post_message(r#"{"type":"CLEAR_EVERYTHING"}"#)
        .await
        .unwrap();
    assert!(failures.is_empty());
    assert!(!registration.refresh().await.unwrap());
    assert_eq!(registration.active().unwrap().config().version, "v1");

    registration
        .post_message(r#"{"type":"SKIP_WAITING"}"#)
        .await
        .unwrap();
    assert!(!registration.update_available());
    assert_eq!(registration.active().unwrap().config().version, "v2");
}
