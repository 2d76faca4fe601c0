use super::{CacheError, RequestKey, ResponseSnapshot};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A named, versioned store of captured responses.
#[async_trait]
pub trait Generation: Send + Sync + fmt::Debug {
    /// The generation's name, for example `static-v1.0.0`.
    fn name(&self) -> &str;

    /// Look up the snapshot stored for the key.
    async fn lookup(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, CacheError>;

    /// Store a snapshot, replacing any previous one for the same key.
    async fn put(&self, key: RequestKey, snapshot: ResponseSnapshot) -> Result<(), CacheError>;

    /// Store several snapshots at once: either every entry is stored, or none is.
    async fn put_all(&self, entries: Vec<(RequestKey, ResponseSnapshot)>)
        -> Result<(), CacheError>;

    /// The keys currently stored, in no particular order.
    async fn keys(&self) -> Result<Vec<RequestKey>, CacheError>;

    /// The number of entries currently stored.
    async fn len(&self) -> Result<usize, CacheError> {
        Ok(self.keys().await?.len())
    }
}

/// The set of generations available to a worker.
#[async_trait]
pub trait CacheStorage: Send + Sync + fmt::Debug {
    /// Open the named generation, creating it if it does not exist yet.
    async fn open(&self, name: &str) -> Result<Arc<dyn Generation>, CacheError>;

    /// Returns `true` if a generation with this name exists.
    async fn has(&self, name: &str) -> Result<bool, CacheError>;

    /// Delete the named generation and everything in it. Returns `false` if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, CacheError>;

    /// The names of all existing generations, sorted.
    async fn keys(&self) -> Result<Vec<String>, CacheError>;
}
