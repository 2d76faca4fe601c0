//! The worker: one version of the offline cache, with its lifecycle and event pipelines.
//!
//! A [`ServiceWorker`] is built from a [`WorkerConfig`] and goes through `install` (pre-cache the
//! manifest into the `static` generation), then `activate` (evict every generation left over from
//! other versions and claim the open pages). Once activated it intercepts fetches:
//!
//! ```no_run
//! # use offline_cache::{config::WorkerConfig, Request, ServiceWorker};
//! # async fn run() -> Result<(), offline_cache::Error> {
//! let worker = ServiceWorker::builder(WorkerConfig::default()).finish()?;
//! worker.install().await?;
//! worker.activate().await?;
//! let resp = worker.fetch(Request::get("https://ovidinternational.com/")).await?;
//! worker.settled().await;
//! # Ok(()) }
//! ```
//!
//! Each event type is handled by a [`Pipeline`] of stages:
//!
//! | Event | Stages |
//! |---|---|
//! | fetch | [`CachingStage`], [`TimingStage`], then any added with [`ServiceWorkerBuilder::with_fetch_stage()`] |
//! | message | [`MessageStage`] |
//! | push | [`PushStage`] |
//! | notification click | [`NotificationClickStage`] |
//! | sync | [`BackgroundSyncStage`] |

use crate::backend::{Backend, BackendCreationError, OriginBackend};
use crate::cache::{
    add_all, CacheError, CacheRepository, CacheStorage, MemoryStorage, PrecacheError,
};
use crate::config::{ConfigError, WorkerConfig};
use crate::diagnostics::TimingStage;
use crate::event::{
    FetchEvent, Lifetime, MessageEvent, NotificationClickEvent, PushEvent, SyncEvent,
};
use crate::host::{Host, LoggingHost};
use crate::http::request::SendError;
use crate::lifecycle::{Lifecycle, LifecycleError, WorkerState};
use crate::message::MessageStage;
use crate::pipeline::{Pipeline, Stage, StageFailure};
use crate::push::{NotificationClickStage, PushStage};
use crate::router::{CacheRouter, CachingStage};
use crate::strategy::offline_response;
use crate::sync::{BackgroundSyncStage, LoggingSyncHook, SyncHook};
use crate::{Request, Response};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a worker could not be built.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendCreationError),
}

/// Why an install failed. The worker is redundant afterwards.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstallError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("invalid manifest: {0}")]
    Manifest(#[from] ConfigError),
    #[error("could not open the static cache generation: {0}")]
    Cache(#[from] CacheError),
    #[error("could not pre-cache the manifest: {0}")]
    Precache(#[from] PrecacheError),
}

/// Why an activation failed.
///
/// A worker whose stale generations could not be evicted stays `activating`, and
/// [`ServiceWorker::activate()`] can be called again.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ActivateError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("could not evict stale cache generations: {0}")]
    Evict(#[from] CacheError),
}

/// One version of the offline cache.
#[derive(Debug)]
pub struct ServiceWorker {
    config: WorkerConfig,
    router: CacheRouter,
    host: Arc<dyn Host>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    lifetime: Lifetime,
    fetch: Pipeline<FetchEvent>,
    message: Pipeline<MessageEvent>,
    push: Pipeline<PushEvent>,
    notification_click: Pipeline<NotificationClickEvent>,
    sync: Pipeline<SyncEvent>,
}

impl ServiceWorker {
    /// Start building a worker for the configuration.
    pub fn builder(config: WorkerConfig) -> ServiceWorkerBuilder {
        ServiceWorkerBuilder::new(config)
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle.lock().state()
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.lifecycle.lock().skip_waiting_requested()
    }

    /// The cache generations this worker version owns.
    pub fn repository(&self) -> &CacheRepository {
        self.router.repository()
    }

    pub fn router(&self) -> &CacheRouter {
        &self.router
    }

    /// Stage names per event type, for diagnostics.
    pub fn fetch_stages(&self) -> Vec<&str> {
        self.fetch.stage_names()
    }

    /// Pre-cache the manifest into the `static` generation.
    ///
    /// All or nothing: if any manifest entry cannot be fetched with a `2xx` status, nothing is
    /// stored and the worker becomes redundant. There is no retry; the next deploy starts a fresh
    /// install.
    pub async fn install(&self) -> Result<(), InstallError> {
        self.lifecycle.lock().begin_install()?;
        match self.precache_manifest().await {
            Ok(stored) => {
                let mut lifecycle = self.lifecycle.lock();
                lifecycle.finish_install()?;
                if self.config.skip_waiting_on_install {
                    lifecycle.skip_waiting();
                }
                log::info!(
                    "installed {}, {} resources pre-cached",
                    self.config.version,
                    stored
                );
                Ok(())
            }
            Err(e) => {
                log::error!("install of {} failed: {}", self.config.version, e);
                self.lifecycle.lock().fail_install()?;
                Err(e)
            }
        }
    }

    async fn precache_manifest(&self) -> Result<usize, InstallError> {
        let urls = self.config.manifest_urls()?;
        let generation = self.repository().static_generation().await?;
        Ok(add_all(generation.as_ref(), self.router.backend().as_ref(), &urls).await?)
    }

    /// Evict every cache generation that does not belong to this version, then claim the open
    /// pages. Returns the names of the evicted generations.
    pub async fn activate(&self) -> Result<Vec<String>, ActivateError> {
        {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.state() != WorkerState::Activating {
                lifecycle.begin_activate()?;
            }
        }
        let evicted = self.repository().evict_stale().await?;
        self.lifecycle.lock().finish_activate()?;
        if let Err(e) = self.host.claim_clients().await {
            log::warn!("could not claim clients: {:#}", e);
        }
        log::info!("activated {}", self.config.version);
        Ok(evicted)
    }

    /// Retire this worker.
    pub fn make_redundant(&self) -> Result<(), LifecycleError> {
        self.lifecycle.lock().make_redundant()
    }

    /// Handle a fetch from a controlled page.
    ///
    /// Until the worker is activated, and for requests the cache does not intercept, the request
    /// goes straight to the network and network errors are returned as they are. Intercepted
    /// requests always get a response.
    pub async fn fetch(&self, req: Request) -> Result<Response, SendError> {
        if !self.state().is_controlling() {
            return req.send(self.router.backend().as_ref()).await;
        }
        let mut event = FetchEvent::new(req, self.lifetime.clone());
        self.fetch.dispatch(&mut event).await;
        if let Some(resp) = event.response.take() {
            return Ok(resp);
        }
        match event.take_request() {
            Some(req) => req.send(self.router.backend().as_ref()).await,
            None => {
                log::error!("fetch of {} was consumed without a response", event.url());
                Ok(offline_response())
            }
        }
    }

    /// Deliver a message from the hosting page.
    pub async fn post_message(&self, data: impl Into<String>) -> Vec<StageFailure> {
        let mut event = MessageEvent::new(data, self.lifetime.clone());
        self.message.dispatch(&mut event).await
    }

    /// Deliver a push message, with its payload if it has one.
    pub async fn push(&self, data: Option<String>) -> Vec<StageFailure> {
        let mut event = PushEvent::new(data, self.lifetime.clone());
        self.push.dispatch(&mut event).await
    }

    /// Deliver a click on a notification. `action` is the clicked action button, if any.
    pub async fn notification_click(
        &self,
        tag: Option<String>,
        action: Option<String>,
    ) -> Vec<StageFailure> {
        let mut event = NotificationClickEvent::new(tag, action, self.lifetime.clone());
        self.notification_click.dispatch(&mut event).await
    }

    /// Deliver a background sync for the tag.
    pub async fn sync(&self, tag: impl Into<String>) -> Vec<StageFailure> {
        let mut event = SyncEvent::new(tag, self.lifetime.clone());
        self.sync.dispatch(&mut event).await
    }

    /// Background tasks started by past events that are still running or not yet collected.
    pub fn pending_tasks(&self) -> usize {
        self.lifetime.pending()
    }

    /// Wait for all background work started by past events. Returns the number of failed tasks.
    pub async fn settled(&self) -> usize {
        self.lifetime.settled().await
    }
}

/// A builder for [`ServiceWorker`]s.
///
/// Anything not supplied gets a default: an [`OriginBackend`] named `origin`, a [`MemoryStorage`],
/// a [`LoggingHost`] and a [`LoggingSyncHook`].
pub struct ServiceWorkerBuilder {
    config: WorkerConfig,
    backend: Option<Arc<dyn Backend>>,
    storage: Option<Arc<dyn CacheStorage>>,
    host: Option<Arc<dyn Host>>,
    sync_hook: Option<Arc<dyn SyncHook>>,
    extra_fetch_stages: Pipeline<FetchEvent>,
}

impl ServiceWorkerBuilder {
    fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            backend: None,
            storage: None,
            host: None,
            sync_hook: None,
            extra_fetch_stages: Pipeline::new(),
        }
    }

    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn CacheStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn host(mut self, host: Arc<dyn Host>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn sync_hook(mut self, hook: Arc<dyn SyncHook>) -> Self {
        self.sync_hook = Some(hook);
        self
    }

    /// Add a fetch stage that runs after the built-in caching and timing stages.
    pub fn with_fetch_stage(mut self, stage: impl Stage<FetchEvent> + 'static) -> Self {
        self.extra_fetch_stages.push(stage);
        self
    }

    /// Validate the configuration and assemble the worker.
    pub fn finish(self) -> Result<ServiceWorker, BuildError> {
        let config = self.config;
        config.validate()?;
        let backend = match self.backend {
            Some(backend) => backend,
            None => Arc::new(
                OriginBackend::builder("origin")
                    .connect_timeout(Duration::from_secs(5))
                    .timeout(Duration::from_secs(30))
                    .finish()?,
            ),
        };
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let host = self.host.unwrap_or_else(|| Arc::new(LoggingHost));
        let sync_hook = self.sync_hook.unwrap_or_else(|| Arc::new(LoggingSyncHook));

        let repository =
            CacheRepository::new(storage, &config.version, config.cache_prefix.as_deref());
        let router = CacheRouter::new(
            repository.clone(),
            backend.clone(),
            config.classifier.clone(),
            config.strategies,
        );
        let lifecycle = Arc::new(Mutex::new(Lifecycle::new()));

        let mut fetch = Pipeline::new()
            .with_stage(CachingStage::new(router.clone()))
            .with_stage(TimingStage::new(config.slow_request_threshold()));
        fetch.extend(self.extra_fetch_stages);
        let message = Pipeline::new().with_stage(MessageStage::new(
            lifecycle.clone(),
            repository,
            backend,
            config.origin.clone(),
        ));
        let push =
            Pipeline::new().with_stage(PushStage::new(host.clone(), config.notification.clone()));
        let notification_click = Pipeline::new().with_stage(NotificationClickStage::new(
            host.clone(),
            config.resolve("/")?,
            config.resolve(&config.notification.explore_url)?,
        ));
        let sync = Pipeline::new().with_stage(BackgroundSyncStage::new(sync_hook));

        Ok(ServiceWorker {
            config,
            router,
            host,
            lifecycle,
            lifetime: Lifetime::new(),
            fetch,
            message,
            push,
            notification_click,
            sync,
        })
    }
}
