//! HTTP responses.

use super::body::Body;
use crate::convert::{ToHeaderName, ToHeaderValue, ToStatusCode};
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{StatusCode, Version};
use mime::Mime;

/// An HTTP response, including body, headers, and status code.
///
/// # Creation and conversion
///
/// Responses can be created programmatically with [`Response::new()`], [`Response::from_body()`]
/// or [`Response::from_status()`], and are returned from a [`Backend`][crate::backend::Backend].
///
/// For interoperability with other Rust libraries, [`Response`] can be converted to and from the
/// [`http`] crate's [`http::Response`] type using the [`From`] and [`Into`] traits.
///
/// # Builder-style methods
///
/// ```
/// # use offline_cache::Response;
/// let resp = Response::from_body("hello")
///     .with_status(201)
///     .with_header("x-served-by", "cache");
/// assert!(resp.is_ok());
/// assert_eq!(resp.get_header_str("x-served-by"), Some("cache"));
/// ```
#[derive(Debug)]
pub struct Response {
    version: Version,
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Body>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// Create a new [`Response`].
    ///
    /// The new response is created with status code `200 OK`, no headers, and an empty body.
    pub fn new() -> Self {
        Self {
            version: Version::HTTP_11,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Make a new response with the same headers, status, and version of this response, but no
    /// body.
    pub fn clone_without_body(&self) -> Response {
        Self {
            version: self.version,
            status: self.status,
            headers: self.headers.clone(),
            body: None,
        }
    }

    /// Clone this response including its body.
    pub fn clone_with_body(&self) -> Response {
        let mut new_resp = self.clone_without_body();
        new_resp.body = self.body.clone();
        new_resp
    }

    /// Create a new [`Response`] with the given value as the body.
    pub fn from_body(body: impl Into<Body>) -> Self {
        Self::new().with_body(body)
    }

    /// Create a new response with the given status code.
    pub fn from_status(status: impl ToStatusCode) -> Self {
        Self::new().with_status(status)
    }

    /// Builder-style equivalent of [`set_body()`][`Self::set_body()`].
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.set_body(body);
        self
    }

    /// Returns `true` if this response has a body.
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Get a shared reference to the body of this response if it has one.
    pub fn get_body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Set the given value as the response's body.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = Some(body.into());
    }

    /// Take and return the body from this response.
    ///
    /// After calling this method, this response will no longer have a body.
    pub fn take_body(&mut self) -> Body {
        self.body.take().unwrap_or_default()
    }

    /// Consume the response and return its body as a byte vector.
    pub fn into_body_bytes(mut self) -> Vec<u8> {
        self.take_body().into_bytes()
    }

    /// Consume the response and return its body as a string.
    ///
    /// # Panics
    ///
    /// If the body does not contain a valid UTF-8 string, this function will panic.
    pub fn into_body_str(mut self) -> String {
        self.take_body().into_string()
    }

    /// Consume the response and return its body.
    pub fn into_body(self) -> Body {
        self.body.unwrap_or_default()
    }

    /// Builder-style equivalent of [`set_body_text_plain()`][`Self::set_body_text_plain()`].
    pub fn with_body_text_plain(mut self, body: &str) -> Self {
        self.set_body_text_plain(body);
        self
    }

    /// Set the given string as the response's body with content type `text/plain; charset=UTF-8`.
    pub fn set_body_text_plain(&mut self, body: &str) {
        self.body = Some(Body::from(body));
        self.set_content_type(mime::TEXT_PLAIN_UTF_8);
    }

    /// Get the MIME type described by the response's
    /// [`Content-Type`](https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/Content-Type)
    /// header, or `None` if that header is absent or contains an invalid MIME type.
    pub fn get_content_type(&self) -> Option<Mime> {
        self.get_header_str(header::CONTENT_TYPE)
            .and_then(|v| v.parse().ok())
    }

    /// Builder-style equivalent of [`set_content_type()`][`Self::set_content_type()`].
    pub fn with_content_type(mut self, mime: Mime) -> Self {
        self.set_content_type(mime);
        self
    }

    /// Set the MIME type described by the response's `Content-Type` header.
    pub fn set_content_type(&mut self, mime: Mime) {
        self.set_header(header::CONTENT_TYPE, mime)
    }

    /// Get the value of the response's `Content-Length` header, if it is valid.
    pub fn get_content_length(&self) -> Option<usize> {
        self.get_header_str(header::CONTENT_LENGTH)
            .and_then(|v| v.parse().ok())
    }

    /// Returns whether the given header name is present in the response.
    pub fn contains_header(&self, name: impl ToHeaderName) -> bool {
        self.headers.contains_key(name.into_owned())
    }

    /// Builder-style equivalent of [`set_header()`][`Self::set_header()`].
    pub fn with_header(mut self, name: impl ToHeaderName, value: impl ToHeaderValue) -> Self {
        self.set_header(name, value);
        self
    }

    /// Get the value of a header as a string, or `None` if the header is not present or its value
    /// is not visible ASCII.
    pub fn get_header_str(&self, name: impl ToHeaderName) -> Option<&str> {
        self.get_header(name).and_then(|v| v.to_str().ok())
    }

    /// Get the value of a header, or `None` if the header is not present.
    pub fn get_header(&self, name: impl ToHeaderName) -> Option<&HeaderValue> {
        self.headers.get(name.into_owned())
    }

    /// Get an iterator of all the response's header names and values.
    pub fn get_headers(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter()
    }

    /// Get a shared reference to the full header map.
    pub fn get_header_map(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set a response header to the given value, discarding any previous values for the given
    /// header name.
    pub fn set_header(&mut self, name: impl ToHeaderName, value: impl ToHeaderValue) {
        self.headers.insert(name.into_owned(), value.into_owned());
    }

    /// Add a response header with given value, keeping any previous values.
    pub fn append_header(&mut self, name: impl ToHeaderName, value: impl ToHeaderValue) {
        self.headers.append(name.into_owned(), value.into_owned());
    }

    /// Remove all response headers of the given name, and return one of the removed header values
    /// if any were present.
    pub fn remove_header(&mut self, name: impl ToHeaderName) -> Option<HeaderValue> {
        self.headers.remove(name.into_owned())
    }

    /// Builder-style equivalent of [`set_status()`][`Self::set_status()`].
    pub fn with_status(mut self, status: impl ToStatusCode) -> Self {
        self.set_status(status);
        self
    }

    /// Get the HTTP status code of the response.
    pub fn get_status(&self) -> StatusCode {
        self.status
    }

    /// Set the HTTP status code of the response.
    pub fn set_status(&mut self, status: impl ToStatusCode) {
        self.status = status.to_status_code();
    }

    /// Returns `true` if the status code is in the `2xx` range.
    ///
    /// Only such responses are ever written into a cache generation.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Builder-style equivalent of [`set_version()`][`Self::set_version()`].
    pub fn with_version(mut self, version: Version) -> Self {
        self.set_version(version);
        self
    }

    /// Get the HTTP version of this response.
    pub fn get_version(&self) -> Version {
        self.version
    }

    /// Set the HTTP version of this response.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Replace all headers of this response with the given map.
    pub(crate) fn set_header_map(&mut self, headers: HeaderMap) {
        self.headers = headers;
    }
}

impl From<Response> for http::Response<Body> {
    fn from(from: Response) -> Self {
        let mut resp = http::Response::new(from.body.unwrap_or_default());
        *resp.headers_mut() = from.headers;
        *resp.status_mut() = from.status;
        *resp.version_mut() = from.version;
        resp
    }
}

impl From<http::Response<Body>> for Response {
    fn from(from: http::Response<Body>) -> Self {
        let (parts, body) = from.into_parts();
        Response {
            version: parts.version,
            status: parts.status,
            headers: parts.headers,
            body: Some(body),
        }
    }
}
