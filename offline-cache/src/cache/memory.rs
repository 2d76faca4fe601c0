use super::{CacheError, CacheStorage, Generation, RequestKey, ResponseSnapshot};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A generation held in process memory.
#[derive(Debug)]
pub struct MemoryGeneration {
    name: String,
    entries: DashMap<RequestKey, ResponseSnapshot>,
    limit: Option<usize>,
    deleted: AtomicBool,
}

impl MemoryGeneration {
    fn new(name: &str, limit: Option<usize>) -> Self {
        Self {
            name: name.to_owned(),
            entries: DashMap::new(),
            limit,
            deleted: AtomicBool::new(false),
        }
    }

    fn check_live(&self) -> Result<(), CacheError> {
        if self.deleted.load(Ordering::Acquire) {
            Err(CacheError::Deleted(self.name.clone()))
        } else {
            Ok(())
        }
    }

    /// Fail if storing `new_keys` additional entries would exceed the limit.
    fn check_room(&self, new_keys: usize) -> Result<(), CacheError> {
        match self.limit {
            Some(limit) if self.entries.len() + new_keys > limit => {
                Err(CacheError::QuotaExceeded {
                    generation: self.name.clone(),
                    limit,
                })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Generation for MemoryGeneration {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, CacheError> {
        self.check_live()?;
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: RequestKey, snapshot: ResponseSnapshot) -> Result<(), CacheError> {
        self.check_live()?;
        if !self.entries.contains_key(&key) {
            self.check_room(1)?;
        }
        self.entries.insert(key, snapshot);
        Ok(())
    }

    async fn put_all(
        &self,
        entries: Vec<(RequestKey, ResponseSnapshot)>,
    ) -> Result<(), CacheError> {
        self.check_live()?;
        let new_keys = entries
            .iter()
            .filter(|(key, _)| !self.entries.contains_key(key))
            .count();
        self.check_room(new_keys)?;
        for (key, snapshot) in entries {
            self.entries.insert(key, snapshot);
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, CacheError> {
        self.check_live()?;
        Ok(self.entries.iter().map(|entry| entry.key().clone()).collect())
    }

    async fn len(&self) -> Result<usize, CacheError> {
        self.check_live()?;
        Ok(self.entries.len())
    }
}

/// Cache storage held in process memory.
///
/// Contents last as long as the storage value. An optional per-generation entry limit stands in
/// for a storage quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    generations: DashMap<String, Arc<MemoryGeneration>>,
    entry_limit: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit every generation to at most `limit` entries; further puts fail with
    /// [`CacheError::QuotaExceeded`].
    pub fn with_entry_limit(limit: usize) -> Self {
        Self {
            generations: DashMap::new(),
            entry_limit: Some(limit),
        }
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn Generation>, CacheError> {
        let generation = self
            .generations
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(MemoryGeneration::new(name, self.entry_limit)))
            .value()
            .clone();
        Ok(generation)
    }

    async fn has(&self, name: &str) -> Result<bool, CacheError> {
        Ok(self.generations.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        match self.generations.remove(name) {
            Some((_, generation)) => {
                generation.deleted.store(true, Ordering::Release);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut names: Vec<String> = self
            .generations
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        Ok(names)
    }
}
