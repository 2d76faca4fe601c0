//! Request interception.

use crate::backend::Backend;
use crate::cache::CacheRepository;
use crate::classify::{Classifier, ResourceClass};
use crate::error::Error;
use crate::event::{FetchEvent, Lifetime};
use crate::pipeline::Stage;
use crate::strategy::{Strategy, StrategyTable};
use crate::{Request, Response};
use async_trait::async_trait;
use http::Method;
use std::fmt;
use std::sync::Arc;

/// Where a served response came from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResponseSource {
    /// A stored snapshot.
    Cache,
    /// A live network response, cached if it was successful.
    Network,
    /// The synthesized `503` placeholder.
    Offline,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cache => "cache",
            Self::Network => "network",
            Self::Offline => "offline",
        })
    }
}

/// A response produced by the router, with how it was produced.
#[derive(Debug)]
pub struct Served {
    pub class: ResourceClass,
    pub strategy: Strategy,
    pub source: ResponseSource,
    pub response: Response,
}

/// The outcome of [`CacheRouter::handle()`].
#[derive(Debug)]
pub enum Intercept {
    /// The router answered the request.
    Respond(Served),
    /// The router does not handle this request; it goes to the network untouched.
    Passthrough(Request),
}

/// Routes intercepted requests to a caching strategy.
///
/// Only `GET` requests for `http` and `https` URLs are intercepted. Each one is classified by URL
/// and served by the strategy the table assigns to its class. Everything else passes through
/// without touching the cache.
#[derive(Clone, Debug)]
pub struct CacheRouter {
    repository: CacheRepository,
    backend: Arc<dyn Backend>,
    classifier: Classifier,
    strategies: StrategyTable,
}

impl CacheRouter {
    pub fn new(
        repository: CacheRepository,
        backend: Arc<dyn Backend>,
        classifier: Classifier,
        strategies: StrategyTable,
    ) -> Self {
        Self {
            repository,
            backend,
            classifier,
            strategies,
        }
    }

    pub fn repository(&self) -> &CacheRepository {
        &self.repository
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Returns `true` if [`handle()`][Self::handle()] would answer this request rather than pass it
    /// through.
    pub fn intercepts(&self, req: &Request) -> bool {
        req.get_method() == Method::GET && req.is_http()
    }

    /// The class and strategy an intercepted request would be served with.
    pub fn route(&self, req: &Request) -> Option<(ResourceClass, Strategy)> {
        if !self.intercepts(req) {
            return None;
        }
        let class = self.classifier.classify(req.get_url());
        Some((class, self.strategies.for_class(class)))
    }

    /// Handle an intercepted request.
    ///
    /// Background revalidation is attached to `lifetime`.
    pub async fn handle(&self, req: Request, lifetime: &Lifetime) -> Intercept {
        let (class, strategy) = match self.route(&req) {
            Some(route) => route,
            None => {
                log::trace!("passing through {} {}", req.get_method(), req.get_url());
                return Intercept::Passthrough(req);
            }
        };
        log::debug!("{} {} as {} via {}", req.get_method(), req.get_url(), class, strategy);
        let (response, source) = strategy
            .serve(req, &self.repository, &self.backend, lifetime)
            .await;
        Intercept::Respond(Served {
            class,
            strategy,
            source,
            response,
        })
    }
}

/// The fetch stage that serves intercepted requests through a [`CacheRouter`].
#[derive(Debug)]
pub struct CachingStage {
    router: CacheRouter,
}

impl CachingStage {
    pub fn new(router: CacheRouter) -> Self {
        Self { router }
    }
}

#[async_trait]
impl Stage<FetchEvent> for CachingStage {
    fn name(&self) -> &str {
        "caching"
    }

    async fn run(&self, event: &mut FetchEvent) -> Result<(), Error> {
        if event.is_answered() {
            return Ok(());
        }
        let req = match event.take_request() {
            Some(req) => req,
            None => return Ok(()),
        };
        let lifetime = event.lifetime().clone();
        match self.router.handle(req, &lifetime).await {
            Intercept::Respond(served) => event.respond_with(served.response, served.source),
            Intercept::Passthrough(req) => event.pass_through(req),
        }
        Ok(())
    }
}
