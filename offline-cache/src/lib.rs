// Warnings (other than unused variables) in doctests are promoted to errors.
#![doc(test(attr(deny(warnings))))]
#![doc(test(attr(allow(dead_code))))]
#![doc(test(attr(allow(unused_variables))))]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::invalid_codeblock_attributes)]

//! # Offline cache engine for static sites.
//!
//! This crate intercepts the fetches a site's pages make and serves each one under a caching
//! strategy chosen from the shape of its URL:
//!
//! - static assets (scripts, stylesheets, images, fonts) are served **cache-first**;
//! - API calls are served **network-first**, with the last good response as a fallback;
//! - pages are served **stale-while-revalidate**.
//!
//! When neither the network nor the cache can answer, the page gets a `503` with a short plain-text
//! body instead of a connection error.
//!
//! Cached responses live in versioned cache generations. A [`ServiceWorker`] pre-caches a manifest
//! of critical resources when it installs, and evicts the generations of every other version when
//! it activates. The hosting page drives workers through a [`Registration`].
//!
//! ## Getting started
//!
//! ```no_run
//! use offline_cache::{config::WorkerConfig, Registration, Request, ServiceWorker};
//! use offline_cache::backend::OriginBackend;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), offline_cache::Error> {
//! let config = WorkerConfig::from_path("offline-cache.json")?;
//! let backend = Arc::new(OriginBackend::builder("origin").finish()?);
//! let mut registration = Registration::new(backend.clone());
//! registration
//!     .register(ServiceWorker::builder(config).backend(backend).finish()?)
//!     .await?;
//!
//! let resp = registration.fetch(Request::get("https://ovidinternational.com/")).await?;
//! println!("{}", resp.get_status());
//! # Ok(()) }
//! ```

pub mod backend;
pub mod cache;
pub mod classify;
pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod host;
pub mod http;
pub mod lifecycle;
pub mod message;
pub mod pipeline;
pub mod push;
pub mod registration;
pub mod router;
pub mod strategy;
pub mod sync;
pub mod worker;

pub use crate::backend::Backend;
#[doc(inline)]
pub use crate::error::Error;
#[doc(inline)]
pub use crate::http::{Body, Request, Response};
#[doc(inline)]
pub use crate::registration::Registration;
#[doc(inline)]
pub use crate::worker::ServiceWorker;

#[cfg(test)]
pub(crate) mod testing {
    //! Fakes shared by the unit tests.

    use crate::backend::Backend;
    use crate::cache::{CacheError, CacheStorage, Generation};
    use crate::error::{anyhow, Error};
    use crate::host::Host;
    use crate::http::request::{SendError, SendErrorCause};
    use crate::push::Notification;
    use crate::{Request, Response};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use url::Url;

    #[derive(Debug)]
    enum Script {
        Respond(u16, String),
        Fail,
    }

    /// A backend answering from a per-URL script. Unscripted URLs get a `404`.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedBackend {
        script: Mutex<HashMap<String, Script>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        fn set(&self, url: &str, script: Script) {
            let url = Url::parse(url).unwrap().to_string();
            self.script.lock().insert(url, script);
        }

        pub(crate) fn respond(&self, url: &str, status: u16, body: &str) {
            self.set(url, Script::Respond(status, body.to_owned()));
        }

        pub(crate) fn fail(&self, url: &str) {
            self.set(url, Script::Fail);
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn send(&self, req: Request) -> Result<Response, SendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = match self.script.lock().get(req.get_url_str()) {
                Some(Script::Respond(status, body)) => Ok((*status, body.clone())),
                Some(Script::Fail) => Err(()),
                None => Ok((404, String::new())),
            };
            match outcome {
                Ok((status, body)) => Ok(Response::from_body(body).with_status(status)),
                Err(()) => Err(SendError::new(
                    self.name(),
                    req.clone_without_body(),
                    SendErrorCause::Connect,
                )),
            }
        }
    }

    /// Storage on which every operation fails.
    #[derive(Debug)]
    pub(crate) struct BrokenStorage;

    #[async_trait]
    impl CacheStorage for BrokenStorage {
        async fn open(&self, _name: &str) -> Result<Arc<dyn Generation>, CacheError> {
            Err(CacheError::Storage(anyhow!("storage unavailable")))
        }

        async fn has(&self, _name: &str) -> Result<bool, CacheError> {
            Err(CacheError::Storage(anyhow!("storage unavailable")))
        }

        async fn delete(&self, _name: &str) -> Result<bool, CacheError> {
            Err(CacheError::Storage(anyhow!("storage unavailable")))
        }

        async fn keys(&self) -> Result<Vec<String>, CacheError> {
            Err(CacheError::Storage(anyhow!("storage unavailable")))
        }
    }

    /// A host that records what it was asked to do.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingHost {
        claims: AtomicUsize,
        opened: Mutex<Vec<Url>>,
        notifications: Mutex<Vec<Notification>>,
    }

    impl RecordingHost {
        pub(crate) fn claims(&self) -> usize {
            self.claims.load(Ordering::SeqCst)
        }

        pub(crate) fn opened(&self) -> Vec<Url> {
            self.opened.lock().clone()
        }

        pub(crate) fn notifications(&self) -> Vec<Notification> {
            self.notifications.lock().clone()
        }
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
}
