//! HTTP requests.

use super::body::Body;
use super::response::Response;
use crate::backend::Backend;
use crate::convert::{ToHeaderName, ToHeaderValue, ToMethod, ToUrl};
use crate::error::{ensure, Error};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Version};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

pub use pending::{PendingRequest, PollResult};

pub(crate) mod pending;

/// An HTTP request, including body, headers, method, and URL.
///
/// # Creation and conversion
///
/// New requests can be created programmatically with [`Request::new()`], or with convenience
/// constructors like [`Request::get()`] which select the method for you. URLs must be absolute.
///
/// For interoperability with other Rust libraries, [`Request`] can be converted to and from the
/// [`http`] crate's [`http::Request`] type using the [`From`] and [`Into`] traits.
///
/// # Sending
///
/// Requests are sent to a [`Backend`] either by awaiting [`send()`][`Self::send()`], or in the
/// background with [`send_async()`][`Self::send_async()`].
///
/// # Builder-style methods
///
/// Methods with the `with_` name prefix return `Self` to allow chaining, and have `set_`
/// equivalents that work through a mutable reference:
///
/// ```
/// # use offline_cache::Request;
/// let req = Request::get("https://example.com/api/data")
///     .with_header("accept", "application/json");
/// assert_eq!(req.get_path(), "/api/data");
/// assert_eq!(req.get_header_str("accept"), Some("application/json"));
/// ```
#[derive(Debug)]
pub struct Request {
    version: Version,
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Body>,
}

impl Request {
    /// Create a new request with the given method and URL, no headers, and an empty body.
    pub fn new(method: impl ToMethod, url: impl ToUrl) -> Self {
        Self {
            version: Version::HTTP_11,
            method: method.into_owned(),
            url: url.into_owned(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Make a new request with the same method, URL, headers, and version of this request, but no
    /// body.
    pub fn clone_without_body(&self) -> Request {
        Self {
            version: self.version,
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: None,
        }
    }

    /// Clone this request including its body.
    pub fn clone_with_body(&self) -> Request {
        let mut new_req = self.clone_without_body();
        new_req.body = self.body.clone();
        new_req
    }

    /// Create a new `GET` [`Request`] with the given URL, no headers, and an empty body.
    pub fn get(url: impl ToUrl) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a new `HEAD` [`Request`] with the given URL, no headers, and an empty body.
    pub fn head(url: impl ToUrl) -> Self {
        Self::new(Method::HEAD, url)
    }

    /// Create a new `POST` [`Request`] with the given URL, no headers, and an empty body.
    pub fn post(url: impl ToUrl) -> Self {
        Self::new(Method::POST, url)
    }

    /// Create a new `PUT` [`Request`] with the given URL, no headers, and an empty body.
    pub fn put(url: impl ToUrl) -> Self {
        Self::new(Method::PUT, url)
    }

    /// Create a new `DELETE` [`Request`] with the given URL, no headers, and an empty body.
    pub fn delete(url: impl ToUrl) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Send the request to the given backend, and return once the response has been received, or
    /// an error occurs.
    ///
    /// The request is validated first: only absolute `http` and `https` URLs with a host can be
    /// sent.
    pub async fn send(self, backend: &dyn Backend) -> Result<Response, SendError> {
        if let Err(e) = validate_request(&self) {
            return Err(SendError::new(
                backend.name(),
                self.clone_without_body(),
                SendErrorCause::Invalid(e),
            ));
        }
        backend.send(self).await
    }

    /// Begin sending the request to the given backend on the runtime, and return a
    /// [`PendingRequest`] that can yield the backend response or an error.
    ///
    /// The send proceeds even if the returned [`PendingRequest`] is dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn send_async(self, backend: Arc<dyn Backend>) -> PendingRequest {
        let sent_req = self.clone_without_body();
        let backend_name = backend.name().to_owned();
        let task = tokio::spawn(async move { self.send(backend.as_ref()).await });
        PendingRequest::new(task, backend_name, sent_req)
    }

    /// Builder-style equivalent of [`set_body()`][`Self::set_body()`].
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.set_body(body);
        self
    }

    /// Returns `true` if this request has a body.
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Set the given value as the request's body.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = Some(body.into());
    }

    /// Take and return the body from this request if it has one, otherwise return `None`.
    pub fn try_take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Consume the request and return its body as a byte vector.
    pub fn into_body_bytes(self) -> Vec<u8> {
        self.body.map(Body::into_bytes).unwrap_or_default()
    }

    /// Returns whether the given header name is present in the request.
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
    ///
    /// If there are multiple values for the header, only one is returned.
    pub fn get_header_str(&self, name: impl ToHeaderName) -> Option<&str> {
        self.get_header(name).and_then(|v| v.to_str().ok())
    }

    /// Get the value of a header, or `None` if the header is not present.
    pub fn get_header(&self, name: impl ToHeaderName) -> Option<&HeaderValue> {
        self.headers.get(name.into_owned())
    }

    /// Get an iterator of all the request's header names and values.
    pub fn get_headers(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter()
    }

    /// Set a request header to the given value, discarding any previous values for the given
    /// header name.
    pub fn set_header(&mut self, name: impl ToHeaderName, value: impl ToHeaderValue) {
        self.headers.insert(name.into_owned(), value.into_owned());
    }

    /// Add a request header with given value, keeping any previous values.
    pub fn append_header(&mut self, name: impl ToHeaderName, value: impl ToHeaderValue) {
        self.headers.append(name.into_owned(), value.into_owned());
    }

    /// Remove all request headers of the given name, and return one of the removed header values
    /// if any were present.
    pub fn remove_header(&mut self, name: impl ToHeaderName) -> Option<HeaderValue> {
        self.headers.remove(name.into_owned())
    }

    /// Builder-style equivalent of [`set_method()`][`Self::set_method()`].
    pub fn with_method(mut self, method: impl ToMethod) -> Self {
        self.set_method(method);
        self
    }

    /// Get the request method as a string.
    pub fn get_method_str(&self) -> &str {
        self.get_method().as_str()
    }

    /// Get the request method.
    pub fn get_method(&self) -> &Method {
        &self.method
    }

    /// Set the request method.
    pub fn set_method(&mut self, method: impl ToMethod) {
        self.method = method.into_owned();
    }

    /// Builder-style equivalent of [`set_url()`][`Self::set_url()`].
    pub fn with_url(mut self, url: impl ToUrl) -> Self {
        self.set_url(url);
        self
    }

    /// Get the request URL as a string.
    pub fn get_url_str(&self) -> &str {
        self.get_url().as_str()
    }

    /// Get a shared reference to the request URL.
    pub fn get_url(&self) -> &Url {
        &self.url
    }

    /// Set the request URL.
    pub fn set_url(&mut self, url: impl ToUrl) {
        self.url = url.into_owned();
    }

    /// Get the path component of the request URL.
    pub fn get_path(&self) -> &str {
        self.url.path()
    }

    /// Get the query component of the request URL, if it exists, as a percent-encoded ASCII
    /// string.
    pub fn get_query_str(&self) -> Option<&str> {
        self.url.query()
    }

    /// Returns `true` if the query string contains the given parameter name.
    pub fn has_query_parameter(&self, parameter: &str) -> bool {
        self.url.query_pairs().any(|(k, _)| k == parameter)
    }

    /// Builder-style equivalent of [`set_version()`][`Self::set_version()`].
    pub fn with_version(mut self, version: Version) -> Self {
        self.set_version(version);
        self
    }

    /// Get the HTTP version of this request.
    pub fn get_version(&self) -> Version {
        self.version
    }

    /// Set the HTTP version of this request.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Returns `true` if the URL scheme is `http` or `https`.
    pub fn is_http(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }
}

/// # Panics
///
/// Panics if the URL cannot be parsed as an [`http::Uri`].
impl From<Request> for http::Request<Body> {
    fn from(from: Request) -> Self {
        let mut req = http::Request::new(from.body.unwrap_or_default());
        *req.headers_mut() = from.headers;
        *req.method_mut() = from.method;
        *req.uri_mut() = String::from(from.url)
            .parse()
            .expect("Url to Uri conversion shouldn't fail, but did");
        *req.version_mut() = from.version;
        req
    }
}

/// Convert an [`http::Request`] carrying an absolute URI.
///
/// # Panics
///
/// Panics if the request URI is not absolute, such as the origin-form `/about`: a [`Request`]
/// always carries a full URL. Set an absolute URI, for example with
/// [`http::request::Builder::uri()`], before converting.
impl From<http::Request<Body>> for Request {
    fn from(from: http::Request<Body>) -> Self {
        let (parts, body) = from.into_parts();
        Request {
            version: parts.version,
            method: parts.method,
            url: Url::parse(&parts.uri.to_string())
                .expect("Uri to Url conversion shouldn't fail, but did"),
            headers: parts.headers,
            body: Some(body),
        }
    }
}

/// The reason that a request sent to a backend failed.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SendErrorCause {
    /// The request could not be sent at all, for example because its URL is not `http`/`https`.
    Invalid(Error),
    /// No connection could be established with the backend.
    Connect,
    /// The backend did not respond in time.
    Timeout,
    /// The backend connection closed before a complete response could be read.
    Incomplete,
    /// The send was abandoned before it completed.
    Cancelled,
    /// All other errors.
    Generic(Error),
}

impl fmt::Display for SendErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SendErrorCause::Invalid(e) => write!(f, "request was invalid: {}", e),
            SendErrorCause::Connect => write!(f, "could not connect to backend"),
            SendErrorCause::Timeout => write!(f, "backend did not respond in time"),
            SendErrorCause::Incomplete => {
                write!(f, "response was not a complete HTTP message")
            }
            SendErrorCause::Cancelled => write!(f, "send was cancelled"),
            SendErrorCause::Generic(e) => write!(f, "generic send error: {}", e),
        }
    }
}

/// An error that occurred while sending a request.
///
/// While the body of a request is always consumed when sent, you can recover the headers and other
/// request metadata of the request that failed using [`SendError::into_sent_req()`].
///
/// Use [`SendError::root_cause()`] to inspect details about what caused the error.
#[derive(Debug, Error)]
#[error("error sending request: {error} to backend {backend}")]
pub struct SendError {
    backend: String,
    sent_req: Request,
    #[source]
    error: SendErrorCause,
}

impl SendError {
    /// Create a new `SendError`.
    ///
    /// Backend implementations use this to report that no response could be obtained.
    pub fn new(backend: impl Into<String>, sent_req: Request, error: SendErrorCause) -> Self {
        SendError {
            backend: backend.into(),
            sent_req,
            error,
        }
    }

    /// Get the name of the backend that returned this error.
    pub fn backend_name(&self) -> &str {
        self.backend.as_str()
    }

    /// Get the underlying cause of this `SendError`.
    pub fn root_cause(&self) -> &SendErrorCause {
        &self.error
    }

    /// Convert the error back into the request that was originally sent, without its body.
    pub fn into_sent_req(self) -> Request {
        self.sent_req
    }
}

/// Check whether a request looks suitable for sending to a backend.
fn validate_request(req: &Request) -> Result<(), Error> {
    ensure!(
        req.is_http() && req.url.has_host(),
        "request URLs must have a scheme (http/https) and a host"
    );
    Ok(())
}
