// Warnings (other than unused variables) in doctests are promoted to errors.
#![doc(test(attr(deny(warnings))))]
#![doc(test(attr(allow(dead_code))))]
#![doc(test(attr(allow(unused_variables))))]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::invalid_codeblock_attributes)]

//! Definitions shared between the offline cache worker and the page that hosts it.
//!
//! Everything in here crosses the boundary between the two: the lifecycle states the page can
//! observe, the control messages it can post, and the push payload the push service delivers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Body of the synthesized response returned when neither the network nor the cache can serve a
/// request.
pub const OFFLINE_BODY: &str = "Offline content not available";

/// Tag of the background sync registration that flushes queued offline actions.
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

/// Notification action that routes a click to the explore target rather than the origin root.
pub const EXPLORE_ACTION: &str = "explore";

/// Vibration pattern used for every notification, in milliseconds.
pub const DEFAULT_VIBRATE_PATTERN: [u32; 3] = [100, 50, 100];

/// Requests taking longer than this are reported as slow by the timing diagnostics.
pub const SLOW_REQUEST_THRESHOLD_MS: u64 = 1000;

/// The lifecycle state of a worker, as observed by the hosting page.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// The worker has been created but installation has not begun.
    Parsed,
    /// The install-time manifest is being populated.
    Installing,
    /// Installation succeeded; the worker waits to be activated.
    Installed,
    /// Stale cache generations are being evicted.
    Activating,
    /// The worker controls its clients and intercepts fetches.
    Activated,
    /// The worker failed to install or was replaced by a newer version.
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        }
    }

    /// Whether a worker in this state intercepts fetches.
    pub fn is_controlling(&self) -> bool {
        matches!(self, Self::Activated)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`WorkerState`] or [`ResourceClass`] name.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown {kind} name: {name:?}")]
pub struct UnknownNameError {
    kind: &'static str,
    name: String,
}

impl FromStr for WorkerState {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parsed" => Ok(Self::Parsed),
            "installing" => Ok(Self::Installing),
            "installed" => Ok(Self::Installed),
            "activating" => Ok(Self::Activating),
            "activated" => Ok(Self::Activated),
            "redundant" => Ok(Self::Redundant),
            other => Err(UnknownNameError {
                kind: "worker state",
                name: other.to_owned(),
            }),
        }
    }
}

/// The category of an intercepted request, which selects the caching strategy that serves it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceClass {
    /// Scripts, stylesheets, images, fonts and anything under a static path prefix.
    StaticAsset,
    /// API calls and third-party API hosts.
    ApiRequest,
    /// Everything else, typically HTML documents.
    Page,
}

impl ResourceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaticAsset => "static-asset",
            Self::ApiRequest => "api-request",
            Self::Page => "page",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceClass {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static-asset" => Ok(Self::StaticAsset),
            "api-request" => Ok(Self::ApiRequest),
            "page" => Ok(Self::Page),
            other => Err(UnknownNameError {
                kind: "resource class",
                name: other.to_owned(),
            }),
        }
    }
}

/// A control message posted by the hosting page to the worker.
///
/// Messages are JSON objects discriminated by their `type` field:
///
/// ```
/// # use offline_cache_shared::ControlMessage;
/// let msg: ControlMessage = serde_json::from_str(r#"{"type":"SKIP_WAITING"}"#).unwrap();
/// assert_eq!(msg, ControlMessage::SkipWaiting);
/// ```
///
/// Unrecognized `type` values are not an error; they become [`ControlMessage::Unknown`] so that the
/// worker can ignore them.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Activate the waiting worker without waiting for existing clients to close.
    #[serde(rename = "SKIP_WAITING")]
    SkipWaiting,
    /// Add the given URLs to the static cache generation.
    #[serde(rename = "CACHE_URLS")]
    CacheUrls {
        /// Absolute URLs, or paths relative to the worker origin.
        #[serde(default)]
        urls: Vec<String>,
    },
    /// Any message type this worker does not understand.
    #[serde(other)]
    Unknown,
}

/// The JSON payload delivered by the push service.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_state_names_round_trip() {
        for state in [
            WorkerState::Parsed,
            WorkerState::Installing,
            WorkerState::Installed,
            WorkerState::Activating,
            WorkerState::Activated,
            WorkerState::Redundant,
        ] {
            assert_eq!(state.as_str().parse::<WorkerState>(), Ok(state));
        }
        assert!("waiting".parse::<WorkerState>().is_err());
    }

    #[test]
    fn only_activated_controls() {
        assert!(WorkerState::Activated.is_controlling());
        assert!(!WorkerState::Installed.is_controlling());
        assert!(!WorkerState::Redundant.is_controlling());
    }

    #[test]
    fn resource_class_uses_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ResourceClass::StaticAsset).unwrap(),
            "\"static-asset\""
        );
        assert_eq!("api-request".parse(), Ok(ResourceClass::ApiRequest));
    }

    #[test]
    fn cache_urls_message_parses() {
        let msg: ControlMessage =
            serde_json::from_str(r#"{"type":"CACHE_URLS","urls":["/a.css","/b.js"]}"#).unwrap();
        match msg {
            ControlMessage::CacheUrls { urls } => assert_eq!(urls, vec!["/a.css", "/b.js"]),
            x => panic!("unexpected result: {:?}", x),
        }
    }

    #[test]
    fn unknown_message_type_is_not_an_error() {
        let msg: ControlMessage =
            serde_json::from_str(r#"{"type":"CLEAR_EVERYTHING","force":true}"#).unwrap();
        assert_eq!(msg, ControlMessage::Unknown);
    }

    #[test]
    fn push_payload_body_is_optional() {
        let payload: PushPayload = serde_json::from_str(r#"{"title":"Hello"}"#).unwrap();
        assert_eq!(payload.title, "Hello");
        assert!(payload.body.is_none());
    }
}
