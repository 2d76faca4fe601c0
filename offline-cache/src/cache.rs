//! Cache generations and the storage that holds them.
//!
//! ## Generations
//!
//! A [`Generation`] is a named store of [`RequestKey`] → [`ResponseSnapshot`] pairs. Generation
//! names embed the worker's version token, for example `static-v1.0.0`, so that a new deploy gets
//! fresh generations while the previous ones keep serving until activation evicts them.
//!
//! Writes are whole-snapshot `put`s that replace any previous entry for the key. There is no
//! partial write: concurrent writers for the same key cannot corrupt an entry, and the last writer
//! wins.
//!
//! ## Storage
//!
//! [`CacheStorage`] opens, lists and deletes generations by name. [`MemoryStorage`] is the
//! in-process implementation. The [`CacheRepository`] sits on top of a storage and knows which two
//! generations (`static` and `dynamic`) are current for this worker version.
//!
//! ## Precaching
//!
//! [`add_all()`] fetches a list of URLs and stores them all, or none of them.

mod generation;
mod key;
mod memory;
mod precache;
mod repository;
mod snapshot;

pub use generation::{CacheStorage, Generation};
pub use key::RequestKey;
pub use memory::{MemoryGeneration, MemoryStorage};
pub use precache::{add_all, PrecacheError};
pub use repository::{CacheRepository, GenerationRole};
pub use snapshot::ResponseSnapshot;

use http::StatusCode;

/// Errors arising from cache operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CacheError {
    /// Only successful (`2xx`) responses may be stored.
    #[error("refusing to cache a response with status {0}")]
    NotCacheable(StatusCode),
    /// The generation has no room for another entry.
    #[error("cache generation {generation} is full ({limit} entries)")]
    QuotaExceeded {
        /// The name of the full generation.
        generation: String,
        /// Its entry limit.
        limit: usize,
    },
    /// The generation was deleted while a handle to it was still held.
    #[error("cache generation {0} has been deleted")]
    Deleted(String),
    /// A storage-specific failure.
    #[error("cache storage error: {0}")]
    Storage(#[source] anyhow::Error),
}
