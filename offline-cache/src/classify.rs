//! URL classification.
//!
//! [`Classifier::classify()`] maps a URL to a [`ResourceClass`] with three ordered rules; the first
//! match wins:
//!
//! 1. **static-asset**: the path starts with a static prefix, or the last path segment has a
//!    static file extension.
//! 2. **api-request**: the path starts with an API prefix, the host contains an API marker, or the
//!    query string has an API parameter.
//! 3. **page**: everything else.
//!
//! Classification depends on the URL alone. It is recomputed for every request and never cached.

pub use offline_cache_shared::ResourceClass;

use serde::{Deserialize, Serialize};
use url::Url;

/// The classification tables.
///
/// Every table can be extended, both from configuration and with the `with_*` builder methods:
///
/// ```
/// # use offline_cache::classify::{Classifier, ResourceClass};
/// # use url::Url;
/// let classifier = Classifier::default().with_static_prefix("/media/");
/// let url = Url::parse("https://example.com/media/reel").unwrap();
/// assert_eq!(classifier.classify(&url), ResourceClass::StaticAsset);
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Classifier {
    pub static_prefixes: Vec<String>,
    /// Extensions without the leading dot, compared case-insensitively.
    pub static_extensions: Vec<String>,
    pub api_prefixes: Vec<String>,
    pub api_host_markers: Vec<String>,
    pub api_query_params: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            static_prefixes: strings(&["/assets/", "/static/", "/src/", "/css/", "/js/"]),
            static_extensions: strings(&[
                // scripts and stylesheets
                "js", "mjs", "css",
                // images
                "svg", "png", "jpg", "jpeg", "gif", "webp", "avif", "ico",
                // fonts
                "woff", "woff2", "ttf", "otf", "eot",
            ]),
            api_prefixes: strings(&["/api/"]),
            api_host_markers: strings(&["googleapis.com", "googletagmanager.com"]),
            api_query_params: strings(&["api"]),
        }
    }
}

impl Classifier {
    /// Classify a URL.
    pub fn classify(&self, url: &Url) -> ResourceClass {
        if self.is_static_asset(url) {
            ResourceClass::StaticAsset
        } else if self.is_api_request(url) {
            ResourceClass::ApiRequest
        } else {
            ResourceClass::Page
        }
    }

    fn is_static_asset(&self, url: &Url) -> bool {
        let path = url.path();
        if self.static_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return true;
        }
        match extension(path) {
            Some(ext) => self
                .static_extensions
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    fn is_api_request(&self, url: &Url) -> bool {
        let path = url.path();
        if self.api_prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return true;
        }
        if let Some(host) = url.host_str() {
            if self.api_host_markers.iter().any(|m| host.contains(m.as_str())) {
                return true;
            }
        }
        url.query_pairs()
            .any(|(name, _)| self.api_query_params.iter().any(|p| *p == name))
    }

    pub fn with_static_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.static_prefixes.push(prefix.into());
        self
    }

    pub fn with_static_extension(mut self, ext: impl Into<String>) -> Self {
        self.static_extensions
            .push(ext.into().trim_start_matches('.').to_owned());
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefixes.push(prefix.into());
        self
    }

    pub fn with_api_host_marker(mut self, marker: impl Into<String>) -> Self {
        self.api_host_markers.push(marker.into());
        self
    }

    pub fn with_api_query_param(mut self, param: impl Into<String>) -> Self {
        self.api_query_params.push(param.into());
        self
    }
}

/// The extension of the last path segment, if it has one.
fn extension(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next()?;
    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(url: &str) -> ResourceClass {
        Classifier::default().classify(&Url::parse(url).unwrap())
    }

    #[test]
    fn static_prefixes_and_extensions() {
        assert_eq!(classify("https://ovid.test/assets/logo.svg"), ResourceClass::StaticAsset);
        assert_eq!(classify("https://ovid.test/assets/chunk"), ResourceClass::StaticAsset);
        assert_eq!(classify("https://ovid.test/favicon.svg"), ResourceClass::StaticAsset);
        assert_eq!(classify("https://ovid.test/fonts/Inter.WOFF2"), ResourceClass::StaticAsset);
        assert_eq!(classify("https://cdn.test/app.js?v=3"), ResourceClass::StaticAsset);
    }

    #[test]
    fn static_wins_over_api() {
        assert_eq!(classify("https://ovid.test/api/schema.json.js"), ResourceClass::StaticAsset);
        assert_eq!(
            classify("https://fonts.googleapis.com/css2/font.css"),
            ResourceClass::StaticAsset
        );
    }

    #[test]
    fn api_rules() {
        assert_eq!(classify("https://ovid.test/api/data"), ResourceClass::ApiRequest);
        assert_eq!(
            classify("https://www.googletagmanager.com/gtag/js?id=G-1"),
            ResourceClass::ApiRequest
        );
        assert_eq!(classify("https://ovid.test/contact?api=1"), ResourceClass::ApiRequest);
    }

    #[test]
    fn everything_else_is_a_page() {
        assert_eq!(classify("https://ovid.test/"), ResourceClass::Page);
        assert_eq!(classify("https://ovid.test/privacy-policy"), ResourceClass::Page);
        assert_eq!(classify("https://ovid.test/index.html"), ResourceClass::Page);
        assert_eq!(classify("https://ovid.test/.well-known"), ResourceClass::Page);
        // a substring of a static extension is not an extension
        assert_eq!(classify("https://ovid.test/jsconf"), ResourceClass::Page);
    }

    #[test]
    fn classification_is_repeatable() {
        let classifier = Classifier::default();
        let url = Url::parse("https://ovid.test/api/data?x=1").unwrap();
        let first = classifier.classify(&url);
        for _ in 0..3 {
            assert_eq!(classifier.classify(&url), first);
        }
    }

    #[test]
    fn extensions_can_be_added_with_a_dot() {
        let classifier = Classifier::default().with_static_extension(".wasm");
        let url = Url::parse("https://ovid.test/pkg/engine.wasm").unwrap();
        assert_eq!(classifier.classify(&url), ResourceClass::StaticAsset);
    }

    #[test]
    fn missing_tables_fall_back_to_defaults() {
        let classifier: Classifier =
            serde_json::from_str(r#"{"api_prefixes":["/v1/"]}"#).unwrap();
        assert_eq!(classifier.api_prefixes, vec!["/v1/"]);
        assert_eq!(classifier.static_prefixes, Classifier::default().static_prefixes);
    }
}
