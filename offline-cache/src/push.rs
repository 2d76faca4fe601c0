//! Push messages and notification clicks.

use crate::config::NotificationConfig;
use crate::error::{Context, Error};
use crate::event::{NotificationClickEvent, PushEvent};
use crate::host::Host;
use crate::pipeline::Stage;
use async_trait::async_trait;
use offline_cache_shared::{PushPayload, EXPLORE_ACTION};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::OffsetDateTime;
use url::Url;

/// A notification to display, in the shape the hosting page's notification API expects.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub options: NotificationOptions,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NotificationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch.
    pub date_of_arrival: i64,
    pub primary_key: u32,
}

impl Notification {
    /// Build the notification for a push payload that arrived at `now`.
    ///
    /// ```
    /// # use offline_cache::config::NotificationConfig;
    /// # use offline_cache::push::Notification;
    /// # use offline_cache_shared::PushPayload;
    /// # use time::OffsetDateTime;
    /// let payload = PushPayload { title: "New work".into(), body: Some("See the reel".into()) };
    /// let n = Notification::from_payload(payload, &NotificationConfig::default(), OffsetDateTime::UNIX_EPOCH);
    /// assert_eq!(n.options.vibrate, vec![100, 50, 100]);
    /// assert_eq!(n.options.data.date_of_arrival, 0);
    /// ```
    pub fn from_payload(
        payload: PushPayload,
        config: &NotificationConfig,
        now: OffsetDateTime,
    ) -> Self {
        let millis = now.unix_timestamp_nanos() / 1_000_000;
        Self {
            title: payload.title,
            options: NotificationOptions {
                body: payload.body,
                icon: config.icon.clone(),
                badge: config.badge.clone(),
                vibrate: config.vibrate.clone(),
                data: NotificationData {
                    date_of_arrival: millis as i64,
                    primary_key: 1,
                },
            },
        }
    }
}

/// Shows a notification for every push message that carries a payload.
#[derive(Debug)]
pub struct PushStage {
    host: Arc<dyn Host>,
    config: NotificationConfig,
}

impl PushStage {
    pub fn new(host: Arc<dyn Host>, config: NotificationConfig) -> Self {
        Self { host, config }
    }
}

#[async_trait]
impl Stage<PushEvent> for PushStage {
    fn name(&self) -> &str {
        "push"
    }

    async fn run(&self, event: &mut PushEvent) -> Result<(), Error> {
        let payload = match event.payload() {
            Some(payload) => payload.context("push payload is not valid JSON")?,
            None => {
                log::debug!("push message without payload, nothing to show");
                return Ok(());
            }
        };
        let notification =
            Notification::from_payload(payload, &self.config, OffsetDateTime::now_utc());
        self.host.show_notification(notification).await
    }
}

/// Closes the clicked notification and opens a window: the explore target for the `explore`
/// action, the origin root for anything else.
#[derive(Debug)]
pub struct NotificationClickStage {
    host: Arc<dyn Host>,
    root: Url,
    explore: Url,
}

impl NotificationClickStage {
    pub fn new(host: Arc<dyn Host>, root: Url, explore: Url) -> Self {
        Self {
            host,
            root,
            explore,
        }
    }

    /// The URL a click with this action opens.
    pub fn target(&self, action: Option<&str>) -> &Url {
        match action {
            Some(EXPLORE_ACTION) => &self.explore,
            _ => &self.root,
        }
    }
}

#[async_trait]
impl Stage<NotificationClickEvent> for NotificationClickStage {
    fn name(&self) -> &str {
        "notification-click"
    }

    async fn run(&self, event: &mut NotificationClickEvent) -> Result<(), Error> {
        event.close();
        let target = self.target(event.action());
        self.host.open_window(target).await
    }
}
