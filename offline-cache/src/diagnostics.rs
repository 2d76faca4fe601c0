//! Request timing diagnostics.

use crate::error::Error;
use crate::event::FetchEvent;
use crate::pipeline::Stage;
use crate::router::ResponseSource;
use async_trait::async_trait;
use std::time::Duration;

/// Reports slow and failed fetches. Runs after the caching stage, so it sees the final response.
#[derive(Clone, Copy, Debug)]
pub struct TimingStage {
    threshold: Duration,
}

impl TimingStage {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn is_slow(&self, elapsed: Duration) -> bool {
        elapsed > self.threshold
    }
}

#[async_trait]
impl Stage<FetchEvent> for TimingStage {
    fn name(&self) -> &str {
        "timing"
    }

    async fn run(&self, event: &mut FetchEvent) -> Result<(), Error> {
        if !event.is_answered() {
            return Ok(());
        }
        if event.source() == Some(ResponseSource::Offline) {
            log::error!("request failed: {}", event.url());
            return Ok(());
        }
        let elapsed = event.started().elapsed();
        if self.is_slow(elapsed) {
            log::warn!(
                "slow request detected: {} took {}ms",
                event.url(),
                elapsed.as_millis()
            );
        }
        Ok(())
    }
}
