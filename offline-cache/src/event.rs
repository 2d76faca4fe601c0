//! Events delivered to a worker, and the lifetime that keeps their background work alive.

use crate::error::Error;
use crate::router::ResponseSource;
use crate::{Request, Response};
use offline_cache_shared::{ControlMessage, PushPayload};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinSet};

/// Background work an event handler started and that must finish before the worker may be torn
/// down.
///
/// Handlers return as soon as they have an answer, and hand anything that can finish later (such
/// as a revalidating fetch) to [`wait_until()`][Self::wait_until()]. The hosting environment awaits
/// [`settled()`][Self::settled()] before it lets the worker go idle.
///
/// Finished tasks are collected whenever new work is started, so a long-lived lifetime only holds
/// the tasks still running. Clones share the same set of tasks.
#[derive(Clone, Debug, Default)]
pub struct Lifetime {
    tasks: Arc<Mutex<JoinSet<Result<(), Error>>>>,
    failed: Arc<AtomicUsize>,
}

impl Lifetime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `work` on the runtime and keep the worker alive until it completes.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn wait_until<F>(&self, work: F)
    where
        F: Future<Output = Result<(), Error>> + Send + 'static,
    {
        let mut tasks = self.tasks.lock();
        while let Some(joined) = tasks.try_join_next() {
            self.record(joined);
        }
        tasks.spawn(work);
    }

    /// The number of tasks that have not been collected yet.
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Wait for every task to finish, including tasks spawned while waiting. Failures are logged
    /// and counted; the count of failures since the last call is returned.
    pub async fn settled(&self) -> usize {
        loop {
            let mut tasks = std::mem::take(&mut *self.tasks.lock());
            if tasks.is_empty() {
                return self.failed.swap(0, Ordering::SeqCst);
            }
            while let Some(joined) = tasks.join_next().await {
                self.record(joined);
            }
        }
    }

    fn record(&self, joined: Result<Result<(), Error>, JoinError>) {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::warn!("background work failed: {:#}", e);
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                log::error!("background task did not complete: {}", e);
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

/// An intercepted fetch.
///
/// The caching stage takes the request and either fills in the response or puts the request back
/// untouched for the network to handle.
#[derive(Debug)]
pub struct FetchEvent {
    pub(crate) request: Option<Request>,
    pub(crate) response: Option<Response>,
    pub(crate) source: Option<ResponseSource>,
    url: url::Url,
    started: Instant,
    lifetime: Lifetime,
}

impl FetchEvent {
    pub fn new(request: Request, lifetime: Lifetime) -> Self {
        Self {
            url: request.get_url().clone(),
            request: Some(request),
            response: None,
            source: None,
            started: Instant::now(),
            lifetime,
        }
    }

    /// The URL of the intercepted request.
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// The request, unless a stage has already consumed it.
    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    pub fn take_request(&mut self) -> Option<Request> {
        self.request.take()
    }

    /// Answer the event. Later stages can still inspect the response.
    pub fn respond_with(&mut self, response: Response, source: ResponseSource) {
        self.response = Some(response);
        self.source = Some(source);
    }

    /// Put a request back for the network to handle, leaving the event unanswered.
    pub fn pass_through(&mut self, request: Request) {
        self.request = Some(request);
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Where the response came from, once the event has been answered.
    pub fn source(&self) -> Option<ResponseSource> {
        self.source
    }

    pub fn is_answered(&self) -> bool {
        self.response.is_some()
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }
}

/// A message posted by the hosting page.
#[derive(Debug)]
pub struct MessageEvent {
    data: String,
    lifetime: Lifetime,
}

impl MessageEvent {
    pub fn new(data: impl Into<String>, lifetime: Lifetime) -> Self {
        Self {
            data: data.into(),
            lifetime,
        }
    }

    /// The raw message text.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Parse the message. Malformed JSON yields `None`; unknown message types yield
    /// [`ControlMessage::Unknown`].
    pub fn message(&self) -> Option<ControlMessage> {
        match serde_json::from_str(&self.data) {
            Ok(msg) => Some(msg),
            Err(e) => {
                log::debug!("ignoring malformed control message: {}", e);
                None
            }
        }
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }
}

/// A message from the push service.
#[derive(Debug)]
pub struct PushEvent {
    data: Option<String>,
    lifetime: Lifetime,
}

impl PushEvent {
    pub fn new(data: Option<String>, lifetime: Lifetime) -> Self {
        Self { data, lifetime }
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Parse the payload, if there is one.
    pub fn payload(&self) -> Option<Result<PushPayload, serde_json::Error>> {
        self.data.as_deref().map(serde_json::from_str)
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }
}

/// A click on a notification this worker showed.
#[derive(Debug)]
pub struct NotificationClickEvent {
    tag: Option<String>,
    action: Option<String>,
    closed: bool,
    lifetime: Lifetime,
}

impl NotificationClickEvent {
    /// `action` is the id of the clicked action button, or `None` for a click on the notification
    /// body.
    pub fn new(tag: Option<String>, action: Option<String>, lifetime: Lifetime) -> Self {
        Self {
            tag,
            action,
            closed: false,
            lifetime,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }
}

/// The browser regained connectivity for a registered sync tag.
#[derive(Debug)]
pub struct SyncEvent {
    tag: String,
    lifetime: Lifetime,
}

impl SyncEvent {
    pub fn new(tag: impl Into<String>, lifetime: Lifetime) -> Self {
        Self {
            tag: tag.into(),
            lifetime,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.lifetime
    }
}
