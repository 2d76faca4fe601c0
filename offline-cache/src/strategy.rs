//! Caching strategies.
//!
//! | Strategy | Reads | Writes | Network failure |
//! |---|---|---|---|
//! | [`CacheFirst`][Strategy::CacheFirst] | `static`, before the network | `static` | `503` |
//! | [`NetworkFirst`][Strategy::NetworkFirst] | `dynamic`, after the network fails | `dynamic` | stale entry, else `503` |
//! | [`StaleWhileRevalidate`][Strategy::StaleWhileRevalidate] | `dynamic`, while the network runs | `dynamic` | stale entry, else `503` |
//!
//! A read that misses the strategy's own generation falls back to the other current generation,
//! so pages pre-cached at install time into `static` are served offline too. Only `2xx` responses
//! are ever written. Storage failures never fail a request: a failed read counts as a miss and a
//! failed write is logged and dropped.

use crate::backend::Backend;
use crate::cache::{CacheRepository, GenerationRole, RequestKey, ResponseSnapshot};
use crate::event::Lifetime;
use crate::router::ResponseSource;
use crate::{Request, Response};
use offline_cache_shared::{ResourceClass, OFFLINE_BODY};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How a request is served.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Serve from the cache; go to the network only on a miss.
    CacheFirst,
    /// Serve from the network; go to the cache only when the network fails.
    NetworkFirst,
    /// Serve from the cache immediately and refresh it in the background.
    StaleWhileRevalidate,
}

impl Strategy {
    /// The generation this strategy writes to, and reads from first.
    pub fn role(&self) -> GenerationRole {
        match self {
            Self::CacheFirst => GenerationRole::Static,
            Self::NetworkFirst | Self::StaleWhileRevalidate => GenerationRole::Dynamic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheFirst => "cache-first",
            Self::NetworkFirst => "network-first",
            Self::StaleWhileRevalidate => "stale-while-revalidate",
        }
    }

    /// Serve a `GET` request with this strategy.
    ///
    /// Never fails: when neither the network nor the cache can answer, the result is the
    /// [`offline_response()`].
    pub async fn serve(
        &self,
        req: Request,
        repository: &CacheRepository,
        backend: &Arc<dyn Backend>,
        lifetime: &Lifetime,
    ) -> (Response, ResponseSource) {
        match self {
            Self::CacheFirst => cache_first(req, repository, backend).await,
            Self::NetworkFirst => network_first(req, repository, backend).await,
            Self::StaleWhileRevalidate => {
                stale_while_revalidate(req, repository, backend, lifetime).await
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The strategy for each resource class.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StrategyTable {
    pub static_asset: Strategy,
    pub api_request: Strategy,
    pub page: Strategy,
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self {
            static_asset: Strategy::CacheFirst,
            api_request: Strategy::NetworkFirst,
            page: Strategy::StaleWhileRevalidate,
        }
    }
}

impl StrategyTable {
    pub fn for_class(&self, class: ResourceClass) -> Strategy {
        match class {
            ResourceClass::StaticAsset => self.static_asset,
            ResourceClass::ApiRequest => self.api_request,
            ResourceClass::Page => self.page,
        }
    }

    pub fn with_strategy(mut self, class: ResourceClass, strategy: Strategy) -> Self {
        match class {
            ResourceClass::StaticAsset => self.static_asset = strategy,
            ResourceClass::ApiRequest => self.api_request = strategy,
            ResourceClass::Page => self.page = strategy,
        }
        self
    }
}

/// The placeholder served when neither the network nor the cache can answer.
///
/// ```
/// # use offline_cache::strategy::offline_response;
/// let resp = offline_response();
/// assert_eq!(resp.get_status(), 503);
/// assert_eq!(resp.into_body_str(), "Offline content not available");
/// ```
pub fn offline_response() -> Response {
    Response::from_status(503).with_body_text_plain(OFFLINE_BODY)
}

async fn cache_first(
    req: Request,
    repository: &CacheRepository,
    backend: &Arc<dyn Backend>,
) -> (Response, ResponseSource) {
    let key = RequestKey::from_request(&req);
    if let Some(snapshot) = lookup(repository, GenerationRole::Static, &key).await {
        return (snapshot.to_response(), ResponseSource::Cache);
    }
    match req.send(backend.as_ref()).await {
        Ok(resp) => {
            store(repository, GenerationRole::Static, key, &resp).await;
            (resp, ResponseSource::Network)
        }
        Err(e) => {
            log::warn!("{} unavailable and not cached: {}", key, e);
            (offline_response(), ResponseSource::Offline)
        }
    }
}

async fn network_first(
    req: Request,
    repository: &CacheRepository,
    backend: &Arc<dyn Backend>,
) -> (Response, ResponseSource) {
    let key = RequestKey::from_request(&req);
    match req.send(backend.as_ref()).await {
        Ok(resp) => {
            store(repository, GenerationRole::Dynamic, key, &resp).await;
            (resp, ResponseSource::Network)
        }
        Err(e) => {
            log::debug!("network failed for {}, trying cache: {}", key, e);
            match lookup(repository, GenerationRole::Dynamic, &key).await {
                Some(snapshot) => (snapshot.to_response(), ResponseSource::Cache),
                None => (offline_response(), ResponseSource::Offline),
            }
        }
    }
}

async fn stale_while_revalidate(
    req: Request,
    repository: &CacheRepository,
    backend: &Arc<dyn Backend>,
    lifetime: &Lifetime,
) -> (Response, ResponseSource) {
    let key = RequestKey::from_request(&req);
    // Start the fetch before reading the cache so the two overlap.
    let pending = req.send_async(backend.clone());
    match lookup(repository, GenerationRole::Dynamic, &key).await {
        Some(snapshot) => {
            let repository = repository.clone();
            let previous = snapshot.digest();
            lifetime.wait_until(async move {
                match pending.wait().await {
                    Ok(resp) => {
                        if store(&repository, GenerationRole::Dynamic, key.clone(), &resp).await {
                            if let Ok(fresh) = ResponseSnapshot::capture(&resp) {
                                if fresh.digest() != previous {
                                    log::debug!("revalidated {} with new content", key);
                                }
                            }
                        }
                    }
                    Err(e) => log::debug!("revalidation of {} failed: {}", key, e),
                }
                Ok(())
            });
            (snapshot.to_response(), ResponseSource::Cache)
        }
        None => match pending.wait().await {
            Ok(resp) => {
                store(repository, GenerationRole::Dynamic, key, &resp).await;
                (resp, ResponseSource::Network)
            }
            Err(e) => {
                log::warn!("{} unavailable and not cached: {}", key, e);
                (offline_response(), ResponseSource::Offline)
            }
        },
    }
}

/// Look the key up in the role's generation, then in the other current generation.
async fn lookup(
    repository: &CacheRepository,
    role: GenerationRole,
    key: &RequestKey,
) -> Option<ResponseSnapshot> {
    let other = match role {
        GenerationRole::Static => GenerationRole::Dynamic,
        GenerationRole::Dynamic => GenerationRole::Static,
    };
    for role in [role, other] {
        let found = match repository.open(role).await {
            Ok(generation) => generation.lookup(key).await,
            Err(e) => Err(e),
        };
        match found {
            Ok(Some(snapshot)) => return Some(snapshot),
            Ok(None) => {}
            Err(e) => log::warn!("cache read for {} failed, treating as a miss: {}", key, e),
        }
    }
    None
}

/// Store a successful response in the role's generation. Returns whether it was stored.
async fn store(
    repository: &CacheRepository,
    role: GenerationRole,
    key: RequestKey,
    resp: &Response,
) -> bool {
    if !resp.is_ok() {
        log::debug!("not caching {}: status {}", key, resp.get_status());
        return false;
    }
    let result = match ResponseSnapshot::capture(resp) {
        Ok(snapshot) => match repository.open(role).await {
            Ok(generation) => generation.put(key.clone(), snapshot).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => true,
        Err(e) => {
            log::warn!("failed to cache {} in {}: {}", key, repository.generation_name(role), e);
            false
        }
    }
}
