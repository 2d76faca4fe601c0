//! Control messages from the hosting page.
//!
//! | Message | Effect |
//! |---|---|
//! | `{"type":"SKIP_WAITING"}` | the waiting worker activates without waiting for clients to close |
//! | `{"type":"CACHE_URLS","urls":[...]}` | the URLs are added to the `static` generation |
//!
//! Anything else, including malformed JSON, is ignored.

pub use offline_cache_shared::ControlMessage;

use crate::backend::Backend;
use crate::cache::{add_all, CacheRepository};
use crate::error::{Context, Error};
use crate::event::MessageEvent;
use crate::lifecycle::Lifecycle;
use crate::pipeline::Stage;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use url::Url;

/// Applies control messages to a worker.
#[derive(Debug)]
pub struct MessageStage {
    lifecycle: Arc<Mutex<Lifecycle>>,
    repository: CacheRepository,
    backend: Arc<dyn Backend>,
    origin: Url,
}

impl MessageStage {
    pub fn new(
        lifecycle: Arc<Mutex<Lifecycle>>,
        repository: CacheRepository,
        backend: Arc<dyn Backend>,
        origin: Url,
    ) -> Self {
        Self {
            lifecycle,
            repository,
            backend,
            origin,
        }
    }

    /// Start precaching the URLs in the background. The run is all-or-nothing.
    fn cache_urls(&self, urls: &[String], event: &MessageEvent) -> Result<(), Error> {
        let urls = urls
            .iter()
            .map(|url| {
                self.origin
                    .join(url)
                    .with_context(|| format!("CACHE_URLS entry {:?} is not a URL", url))
            })
            .collect::<Result<Vec<Url>, Error>>()?;
        let repository = self.repository.clone();
        let backend = self.backend.clone();
        event.lifetime().wait_until(async move {
            let generation = repository.static_generation().await?;
            let stored = add_all(generation.as_ref(), backend.as_ref(), &urls).await?;
            log::info!("cached {} URLs on request", stored);
            Ok(())
        });
        Ok(())
    }
}

#[async_trait]
impl Stage<MessageEvent> for MessageStage {
    fn name(&self) -> &str {
        "control-message"
    }

    async fn run(&self, event: &mut MessageEvent) -> Result<(), Error> {
        match event.message() {
            Some(ControlMessage::SkipWaiting) => {
                self.lifecycle.lock().skip_waiting();
                Ok(())
            }
            Some(ControlMessage::CacheUrls { urls }) => self.cache_urls(&urls, event),
            Some(ControlMessage::Unknown) => {
                log::debug!("ignoring control message {}", event.data());
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStorage;
    use crate::event::Lifetime;
    use crate::testing::ScriptedBackend;

    fn stage() -> (MessageStage, Arc<Mutex<Lifecycle>>, Arc<ScriptedBackend>) {
        let lifecycle = Arc::new(Mutex::new(Lifecycle::new()));
        let backend = Arc::new(ScriptedBackend::new());
        let stage = MessageStage::new(
            lifecycle.clone(),
            CacheRepository::new(Arc::new(MemoryStorage::new()), "v1", None),
            backend.clone(),
            Url::parse("https://ovid.test/").unwrap(),
        );
        (stage, lifecycle, backend)
    }

    #[tokio::test]
    async fn skip_waiting_sets_the_flag() {
        let (stage, lifecycle, _) = stage();
        let mut event = MessageEvent::new(r#"{"type":"SKIP_WAITING"}"#, Lifetime::new());
        stage.run(&mut event).await.unwrap();
        assert!(lifecycle.lock().skip_waiting_requested());
    }

    #[tokio::test]
    async fn cache_urls_resolves_against_the_origin() {
        let (stage, _, backend) = stage();
        backend.respond("https://ovid.test/privacy", 200, "privacy");
        backend.respond("https://cdn.test/font.woff2", 200, "font");
        let lifetime = Lifetime::new();
        let mut event = MessageEvent::new(
            r#"{"type":"CACHE_URLS","urls":["/privacy","https://cdn.test/font.woff2"]}"#,
            lifetime.clone(),
        );
        stage.run(&mut event).await.unwrap();
        assert_eq!(lifetime.settled().await, 0);

        let generation = stage.repository.static_generation().await.unwrap();
        let mut keys: Vec<String> = generation
            .keys()
            .await
            .unwrap()
            .iter()
            .map(|key| key.url().to_string())
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["https://cdn.test/font.woff2", "https://ovid.test/privacy"]);
    }

    #[tokio::test]
    async fn failed_cache_urls_stores_nothing() {
        let (stage, _, backend) = stage();
        backend.respond("https://ovid.test/a", 200, "a");
        backend.fail("https://ovid.test/b");
        let lifetime = Lifetime::new();
        let mut event = MessageEvent::new(
            r#"{"type":"CACHE_URLS","urls":["/a","/b"]}"#,
            lifetime.clone(),
        );
        stage.run(&mut event).await.unwrap();
        assert_eq!(lifetime.settled().await, 1);
        let generation = stage.repository.static_generation().await.unwrap();
        assert_eq!(generation.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_and_malformed_messages_are_ignored() {
        let (stage, lifecycle, backend) = stage();
        for data in [r#"{"type":"RELOAD"}"#, "SKIP_WAITING", r#"{"kind":"x"}"#] {
            let mut event = MessageEvent::new(data, Lifetime::new());
            stage.run(&mut event).await.unwrap();
        }
        assert!(!lifecycle.lock().skip_waiting_requested());
        assert_eq!(backend.calls(), 0);
    }
}
