//! Background sync.
//!
//! When connectivity returns, the host delivers a [`SyncEvent`] for every registered tag. The
//! `background-sync` tag flushes whatever the site queued while offline, through a [`SyncHook`].

use crate::error::Error;
use crate::event::SyncEvent;
use crate::pipeline::Stage;
use async_trait::async_trait;
use offline_cache_shared::BACKGROUND_SYNC_TAG;
use std::fmt;
use std::sync::Arc;

/// Flushes actions queued while offline.
#[async_trait]
pub trait SyncHook: Send + Sync + fmt::Debug {
    async fn flush(&self) -> Result<(), Error>;
}

/// A hook with nothing queued.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingSyncHook;

#[async_trait]
impl SyncHook for LoggingSyncHook {
    async fn flush(&self) -> Result<(), Error> {
        log::info!("background sync: nothing queued");
        Ok(())
    }
}

/// Runs the hook for the `background-sync` tag. Hook failures are logged here and never reach the
/// host.
#[derive(Debug)]
pub struct BackgroundSyncStage {
    hook: Arc<dyn SyncHook>,
}

impl BackgroundSyncStage {
    pub fn new(hook: Arc<dyn SyncHook>) -> Self {
        Self { hook }
    }
}

#[async_trait]
impl Stage<SyncEvent> for BackgroundSyncStage {
    fn name(&self) -> &str {
        "background-sync"
    }

    async fn run(&self, event: &mut SyncEvent) -> Result<(), Error> {
        if event.tag() != BACKGROUND_SYNC_TAG {
            log::debug!("ignoring sync tag {:?}", event.tag());
            return Ok(());
        }
        if let Err(e) = self.hook.flush().await {
            log::error!("background sync failed: {:#}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::anyhow;
    use crate::event::Lifetime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingHook {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SyncHook for CountingHook {
        async fn flush(&self) -> Result<(), Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(anyhow!("queue unreachable"))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn only_the_background_sync_tag_flushes() {
        let hook = Arc::new(CountingHook::default());
        let stage = BackgroundSyncStage::new(hook.clone());
        stage
            .run(&mut SyncEvent::new("other", Lifetime::new()))
            .await
            .unwrap();
        stage
            .run(&mut SyncEvent::new(BACKGROUND_SYNC_TAG, Lifetime::new()))
            .await
            .unwrap();
        assert_eq!(hook.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hook_failures_are_caught() {
        let hook = Arc::new(CountingHook {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let stage = BackgroundSyncStage::new(hook.clone());
        let mut event = SyncEvent::new(BACKGROUND_SYNC_TAG, Lifetime::new());
        assert!(stage.run(&mut event).await.is_ok());
        assert_eq!(hook.calls.load(Ordering::SeqCst), 1);
    }
}
