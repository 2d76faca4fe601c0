//! The hosting environment, as seen from a worker.

use crate::error::Error;
use crate::push::Notification;
use async_trait::async_trait;
use std::fmt;
use url::Url;

/// What a worker can ask of the environment that runs it.
#[async_trait]
pub trait Host: Send + Sync + fmt::Debug {
    /// Take control of every open page, so their next fetch is intercepted without a reload.
    async fn claim_clients(&self) -> Result<(), Error>;

    /// Open a window (or focus a tab) showing the URL.
    async fn open_window(&self, url: &Url) -> Result<(), Error>;

    /// Display a notification.
    async fn show_notification(&self, notification: Notification) -> Result<(), Error>;
}

/// A host that only logs what it is asked to do.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingHost;

#[async_trait]
impl Host for LoggingHost {
    async fn claim_clients(&self) -> Result<(), Error> {
        log::info!("claiming clients");
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<(), Error> {
        log::info!("opening window at {}", url);
        Ok(())
    }

    async fn show_notification(&self, notification: Notification) -> Result<(), Error> {
        log::info!("showing notification {:?}", notification.title);
        Ok(())
    }
}
