use super::{CacheError, CacheStorage, Generation};
use std::fmt;
use std::sync::Arc;

/// The two generations a worker version owns.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GenerationRole {
    /// Pre-cached critical resources and cache-first static assets.
    Static,
    /// Network-first API responses and revalidated pages.
    Dynamic,
}

impl GenerationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for GenerationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the storage handle and knows which generations are current for one worker version.
///
/// Generation names are `{prefix}-{role}-{version}`, or `{role}-{version}` without a prefix:
///
/// ```
/// # use offline_cache::cache::{CacheRepository, GenerationRole, MemoryStorage};
/// # use std::sync::Arc;
/// let repo = CacheRepository::new(Arc::new(MemoryStorage::new()), "v1.0.0", Some("ovid"));
/// assert_eq!(repo.generation_name(GenerationRole::Static), "ovid-static-v1.0.0");
/// assert!(repo.is_current("ovid-dynamic-v1.0.0"));
/// assert!(!repo.is_current("ovid-dynamic-v0.9.0"));
/// ```
#[derive(Clone, Debug)]
pub struct CacheRepository {
    storage: Arc<dyn CacheStorage>,
    static_name: String,
    dynamic_name: String,
}

impl CacheRepository {
    pub fn new(storage: Arc<dyn CacheStorage>, version: &str, prefix: Option<&str>) -> Self {
        let name = |role: GenerationRole| match prefix {
            Some(prefix) => format!("{prefix}-{role}-{version}"),
            None => format!("{role}-{version}"),
        };
        Self {
            static_name: name(GenerationRole::Static),
            dynamic_name: name(GenerationRole::Dynamic),
            storage,
        }
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// The name of the current generation for the role.
    pub fn generation_name(&self, role: GenerationRole) -> &str {
        match role {
            GenerationRole::Static => &self.static_name,
            GenerationRole::Dynamic => &self.dynamic_name,
        }
    }

    /// Returns `true` if the name belongs to one of this version's generations.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_name || name == self.dynamic_name
    }

    /// Open (creating if needed) the current generation for the role.
    pub async fn open(&self, role: GenerationRole) -> Result<Arc<dyn Generation>, CacheError> {
        self.storage.open(self.generation_name(role)).await
    }

    pub async fn static_generation(&self) -> Result<Arc<dyn Generation>, CacheError> {
        self.open(GenerationRole::Static).await
    }

    pub async fn dynamic_generation(&self) -> Result<Arc<dyn Generation>, CacheError> {
        self.open(GenerationRole::Dynamic).await
    }

    /// Delete every generation that is not current, and return the deleted names.
    pub async fn evict_stale(&self) -> Result<Vec<String>, CacheError> {
        let mut deleted = Vec::new();
        for name in self.storage.keys().await? {
            if self.is_current(&name) {
                continue;
            }
            log::info!("deleting old cache generation {}", name);
            if self.storage.delete(&name).await? {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }
}
