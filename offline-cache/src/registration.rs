//! The hosting page's view of its workers.

use crate::backend::Backend;
use crate::http::request::SendError;
use crate::lifecycle::WorkerState;
use crate::pipeline::StageFailure;
use crate::worker::{ActivateError, InstallError, ServiceWorker};
use crate::{Request, Response};
use offline_cache_shared::ControlMessage;
use std::sync::Arc;

/// Holds the active worker, and at most one installed worker waiting to replace it.
///
/// ```no_run
/// # use offline_cache::{config::WorkerConfig, Registration, ServiceWorker};
/// # use offline_cache::backend::OriginBackend;
/// # use std::sync::Arc;
/// # async fn run() -> Result<(), offline_cache::Error> {
/// let backend = Arc::new(OriginBackend::builder("origin").finish()?);
/// let mut registration = Registration::new(backend.clone());
/// let worker = ServiceWorker::builder(WorkerConfig::default())
///     .backend(backend)
///     .finish()?;
/// registration.register(worker).await?;
/// if registration.update_available() {
///     registration.skip_waiting().await?;
/// }
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Registration {
    backend: Arc<dyn Backend>,
    active: Option<ServiceWorker>,
    waiting: Option<ServiceWorker>,
}

/// Why [`Registration::register()`] failed.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegisterError {
    /// The new worker failed to install and was discarded. The active worker is unchanged.
    #[error(transparent)]
    Install(#[from] InstallError),
    /// The new worker installed but could not be activated.
    #[error(transparent)]
    Activate(#[from] ActivateError),
}

impl Registration {
    /// `backend` serves requests while no worker is active.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            active: None,
            waiting: None,
        }
    }

    pub fn active(&self) -> Option<&ServiceWorker> {
        self.active.as_ref()
    }

    pub fn waiting(&self) -> Option<&ServiceWorker> {
        self.waiting.as_ref()
    }

    /// Returns `true` if an installed worker is waiting to take over.
    pub fn update_available(&self) -> bool {
        self.waiting.is_some()
    }

    /// Install a new worker version.
    ///
    /// On success the worker is activated right away if it asked to skip waiting or nothing is
    /// active yet; otherwise it waits, and [`update_available()`][Self::update_available()]
    /// returns `true`. Returns the worker's resulting state.
    pub async fn register(&mut self, worker: ServiceWorker) -> Result<WorkerState, RegisterError> {
        worker.install().await?;
        if worker.skip_waiting_requested() || self.active.is_none() {
            self.promote(worker).await?;
            return Ok(WorkerState::Activated);
        }
        log::info!("{} installed and waiting", worker.config().version);
        if let Some(previous) = self.waiting.replace(worker) {
            retire(&previous);
        }
        Ok(WorkerState::Installed)
    }

    /// Tell the waiting worker to skip waiting, and activate it. Returns `false` if nothing was
    /// waiting.
    pub async fn skip_waiting(&mut self) -> Result<bool, ActivateError> {
        let worker = match &self.waiting {
            Some(worker) => worker,
            None => return Ok(false),
        };
        match serde_json::to_string(&ControlMessage::SkipWaiting) {
            Ok(msg) => {
                worker.post_message(msg).await;
            }
            Err(e) => log::warn!("could not encode SKIP_WAITING: {}", e),
        }
        self.refresh().await
    }

    /// Deliver a message from the page to the waiting worker, or to the active one if nothing is
    /// waiting. A waiting worker told to skip waiting takes over before this returns.
    pub async fn post_message(
        &mut self,
        data: impl Into<String>,
    ) -> Result<Vec<StageFailure>, ActivateError> {
        let failures = match self.waiting.as_ref().or(self.active.as_ref()) {
            Some(worker) => worker.post_message(data).await,
            None => return Ok(Vec::new()),
        };
        self.refresh().await?;
        Ok(failures)
    }

    /// Activate the waiting worker if it has been told to skip waiting since it was parked, for
    /// example by a message posted to it directly. Returns whether it took over.
    pub async fn refresh(&mut self) -> Result<bool, ActivateError> {
        let worker = match self.waiting.take() {
            Some(worker) if worker.skip_waiting_requested() => worker,
            other => {
                self.waiting = other;
                return Ok(false);
            }
        };
        self.promote(worker).await?;
        Ok(true)
    }

    /// Activate the worker and make it the active one. A worker that fails to activate is parked
    /// as waiting, so that activation can be retried.
    async fn promote(&mut self, worker: ServiceWorker) -> Result<(), ActivateError> {
        if let Err(e) = worker.activate().await {
            log::error!("activation of {} failed: {}", worker.config().version, e);
            if let Some(previous) = self.waiting.replace(worker) {
                retire(&previous);
            }
            return Err(e);
        }
        if let Some(previous) = self.active.replace(worker) {
            retire(&previous);
        }
        Ok(())
    }

    /// Fetch through the active worker, or straight from the network if there is none.
    pub async fn fetch(&self, req: Request) -> Result<Response, SendError> {
        match &self.active {
            Some(worker) => worker.fetch(req).await,
            None => req.send(self.backend.as_ref()).await,
        }
    }

    /// Wait for background work of every worker held.
    pub async fn settled(&self) -> usize {
        let mut failed = 0;
        for worker in self.active.iter().chain(self.waiting.iter()) {
            failed += worker.settled().await;
        }
        failed
    }
}

fn retire(worker: &ServiceWorker) {
    if let Err(e) = worker.make_redundant() {
        log::warn!("could not retire worker {}: {}", worker.config().version, e);
    }
}
