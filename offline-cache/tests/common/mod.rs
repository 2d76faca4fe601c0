#![allow(dead_code)]

use offline_cache::backend::Backend;
use offline_cache::config::WorkerConfig;
use offline_cache::error::{Error, SendError, SendErrorCause};
use offline_cache::host::Host;
use offline_cache::push::Notification;
use offline_cache::{Request, Response};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

pub const ORIGIN: &str = "https://ovid.test/";

pub fn url(path: &str) -> String {
    Url::parse(ORIGIN).unwrap().join(path).unwrap().to_string()
}

pub fn config(version: &str, manifest: &[&str]) -> WorkerConfig {
    WorkerConfig {
        origin: Url::parse(ORIGIN).unwrap(),
        version: version.to_owned(),
        manifest: manifest.iter().map(|s| s.to_string()).collect(),
        ..WorkerConfig::default()
    }
}

#[derive(Clone, Debug)]
enum Script {
    Respond(u16, String),
    Fail,
}

/// A scripted network. Paths are resolved against [`ORIGIN`]; unscripted URLs answer `404`.
///
/// A URL can be gated: sends to it wait until [`FakeNetwork::release`] is called.
#[derive(Debug, Default)]
pub struct FakeNetwork {
    script: Mutex<HashMap<String, Script>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    calls: Mutex<Vec<String>>,
    total: AtomicUsize,
}

impl FakeNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.script
            .lock()
            .insert(url(path), Script::Respond(status, body.to_owned()));
    }

    pub fn fail(&self, path: &str) {
        self.script.lock().insert(url(path), Script::Fail);
    }

    pub fn gate(&self, path: &str) {
        self.gates.lock().insert(url(path), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, path: &str) {
        if let Some(gate) = self.gates.lock().remove(&url(path)) {
            gate.add_permits(Semaphore::MAX_PERMITS);
        }
    }

    pub fn calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn calls_to(&self, path: &str) -> usize {
        let target = url(path);
        self.calls.lock().iter().filter(|u| **u == target).count()
    }
}

#[async_trait]
impl Backend for FakeNetwork {
    fn name(&self) -> &str {
        "fake-network"
    }

    async fn send(&self, req: Request) -> Result<Response, SendError> {
        let target = req.get_url_str().to_owned();
        self.total.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(target.clone());
        let gate = self.gates.lock().get(&target).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }
        let script = self.script.lock().get(&target).cloned();
        match script {
            Some(Script::Respond(status, body)) => {
                Ok(Response::from_body(body).with_status(status))
            }
            Some(Script::Fail) => Err(SendError::new(
                self.name(),
                req.clone_without_body(),
                SendErrorCause::Connect,
            )),
            None => Ok(Response::from_status(404)),
        }
    }
}

/// A host that records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub claims: AtomicUsize,
    pub opened: Mutex<Vec<Url>>,
    pub notifications: Mutex<Vec<Notification>>,
}

#[async_trait]
impl Host for RecordingHost {
    async fn claim_clients(&self) -> Result<(), Error> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<(), Error> {
        self.opened.lock().push(url.clone());
        Ok(())
    }

    async fn show_notification(&self, notification: Notification) -> Result<(), Error> {
        self.notifications.lock().push(notification);
        Ok(())
    }
}
