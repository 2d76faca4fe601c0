//! Worker configuration.
//!
//! A [`WorkerConfig`] carries everything that differs between sites and deploys: the origin, the
//! version token baked into generation names, the install-time manifest, the classification tables
//! and the strategy for each resource class. It is usually loaded from JSON:
//!
//! ```
//! # use offline_cache::config::WorkerConfig;
//! let config = WorkerConfig::from_json(r#"{
//!     "origin": "https://ovidinternational.com",
//!     "version": "v1.0.1",
//!     "manifest": ["/", "/favicon.svg"]
//! }"#).unwrap();
//! assert_eq!(config.manifest_urls().unwrap().len(), 2);
//! ```
//!
//! Any field left out takes its default value.

use crate::classify::Classifier;
use crate::strategy::StrategyTable;
use offline_cache_shared::{DEFAULT_VIBRATE_PATTERN, SLOW_REQUEST_THRESHOLD_MS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid JSON, or does not match the expected shape.
    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configuration parsed, but a value is unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Presentation of push notifications.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    /// Where a click on the `explore` action leads, relative to the origin.
    pub explore_url: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            icon: "/assets/ovid-logo.svg".to_owned(),
            badge: "/assets/ovid-logo.svg".to_owned(),
            vibrate: DEFAULT_VIBRATE_PATTERN.to_vec(),
            explore_url: "/#portfolio".to_owned(),
        }
    }
}

/// Everything a worker needs to know about the site it serves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// The origin the worker is registered for. Relative URLs resolve against it.
    pub origin: Url,
    /// The version token embedded in generation names. Changing it on deploy evicts the previous
    /// generations at activation.
    pub version: String,
    /// Optional prefix for generation names, for example the site name.
    pub cache_prefix: Option<String>,
    /// Critical resources pre-cached at install time. Every entry must fetch successfully or the
    /// install fails.
    pub manifest: Vec<String>,
    pub classifier: Classifier,
    pub strategies: StrategyTable,
    pub notification: NotificationConfig,
    /// Requests slower than this are reported by the timing diagnostics.
    pub slow_request_threshold_ms: u64,
    /// Ask to be activated right after a successful install instead of waiting for the previous
    /// worker's clients to close.
    pub skip_waiting_on_install: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            origin: Url::parse("https://ovidinternational.com/").expect("default origin is valid"),
            version: "v1.0.0".to_owned(),
            cache_prefix: None,
            manifest: [
                "/",
                "/index.html",
                "/assets/ovid-logo.svg",
                "/assets/ovid-logo2.svg",
                "/favicon.svg",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            classifier: Classifier::default(),
            strategies: StrategyTable::default(),
            notification: NotificationConfig::default(),
            slow_request_threshold_ms: SLOW_REQUEST_THRESHOLD_MS,
            skip_waiting_on_install: true,
        }
    }
}

impl WorkerConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.origin.scheme(), "http" | "https") || !self.origin.has_host() {
            return Err(ConfigError::Invalid(format!(
                "origin must be an http(s) URL with a host, got {}",
                self.origin
            )));
        }
        if self.version.is_empty() || self.version.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "version must be a non-empty token without whitespace, got {:?}",
                self.version
            )));
        }
        self.manifest_urls()?;
        self.resolve(&self.notification.explore_url)?;
        Ok(())
    }

    /// Resolve a path or absolute URL against the origin.
    pub fn resolve(&self, url: &str) -> Result<Url, ConfigError> {
        self.origin
            .join(url)
            .map_err(|e| ConfigError::Invalid(format!("cannot resolve {:?}: {}", url, e)))
    }

    /// The install-time manifest as absolute URLs, in order.
    pub fn manifest_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.manifest.iter().map(|entry| self.resolve(entry)).collect()
    }

    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_request_threshold_ms)
    }
}
