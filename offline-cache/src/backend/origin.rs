use super::{validate_backend, Backend, BackendError};
use crate::error::Error;
use crate::http::request::{SendError, SendErrorCause};
use crate::{Request, Response};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// A backend that sends requests over the network with an HTTP client.
///
/// Construct one with [`OriginBackend::builder()`]:
///
/// ```no_run
/// # use offline_cache::backend::OriginBackend;
/// # use std::time::Duration;
/// let origin = OriginBackend::builder("origin")
///     .connect_timeout(Duration::from_millis(500))
///     .finish()
///     .unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct OriginBackend {
    name: String,
    client: reqwest::Client,
}

impl OriginBackend {
    /// Start building a new backend with the given name.
    pub fn builder(name: impl ToString) -> OriginBackendBuilder {
        OriginBackendBuilder::new(name)
    }
}

#[async_trait]
impl Backend for OriginBackend {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    async fn send(&self, mut req: Request) -> Result<Response, SendError> {
        let sent_req = req.clone_without_body();
        let mut builder = self
            .client
            .request(req.get_method().clone(), req.get_url().clone())
            .version(req.get_version());
        for (name, value) in req.get_headers() {
            builder = builder.header(name, value);
        }
        if let Some(body) = req.try_take_body() {
            builder = builder.body(body.into_shared());
        }

        let resp = match builder.send().await {
            Ok(resp) => resp,
            Err(e) => return Err(SendError::new(&self.name, sent_req, classify_error(e))),
        };
        let status = resp.status();
        let version = resp.version();
        let headers = resp.headers().clone();
        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                return Err(SendError::new(&self.name, sent_req, SendErrorCause::Timeout))
            }
            Err(_) => {
                return Err(SendError::new(
                    &self.name,
                    sent_req,
                    SendErrorCause::Incomplete,
                ))
            }
        };

        let mut response = Response::from_body(body)
            .with_status(status)
            .with_version(version);
        response.set_header_map(headers);
        Ok(response)
    }
}

fn classify_error(e: reqwest::Error) -> SendErrorCause {
    if e.is_timeout() {
        SendErrorCause::Timeout
    } else if e.is_connect() {
        SendErrorCause::Connect
    } else if e.is_builder() {
        SendErrorCause::Invalid(Error::new(e))
    } else {
        SendErrorCause::Generic(Error::new(e))
    }
}

/// Errors that can arise from attempting to create an [`OriginBackend`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendCreationError {
    /// The backend name is not valid.
    #[error("invalid backend name: {0}")]
    InvalidName(#[from] BackendError),
    /// The user agent is not a valid header value.
    #[error("invalid user agent: {0:?}")]
    InvalidUserAgent(String),
    /// The underlying HTTP client could not be created.
    #[error("could not create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A builder for an [`OriginBackend`].
///
/// Consume the builder with [`finish()`][Self::finish()] to obtain the backend.
#[derive(Debug)]
pub struct OriginBackendBuilder {
    name: String,
    connect_timeout: Duration,
    timeout: Duration,
    user_agent: Option<String>,
    pool_connections: bool,
}

impl OriginBackendBuilder {
    /// Create a builder for a backend with the given name.
    pub fn new(name: impl ToString) -> Self {
        OriginBackendBuilder {
            name: name.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            pool_connections: true,
        }
    }

    /// Set the connection timeout for this backend. Defaults to 1,000ms (1s).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the timeout for the whole request, from connection until the body has been read.
    /// Defaults to 15,000ms (15s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` sent with every request.
    pub fn user_agent(mut self, agent: impl ToString) -> Self {
        self.user_agent = Some(agent.to_string());
        self
    }

    /// Determine whether or not connections to the same backend should be pooled across
    /// requests. Defaults to `true`.
    pub fn enable_pooling(mut self, value: bool) -> Self {
        self.pool_connections = value;
        self
    }

    /// Create the backend.
    pub fn finish(self) -> Result<OriginBackend, BackendCreationError> {
        validate_backend(&self.name)?;
        let mut client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout);
        if let Some(agent) = self.user_agent {
            let value = http::HeaderValue::from_str(&agent)
                .map_err(|_| BackendCreationError::InvalidUserAgent(agent.clone()))?;
            client = client.user_agent(value);
        }
        if !self.pool_connections {
            client = client.pool_max_idle_per_host(0);
        }
        let client = client.build().map_err(BackendCreationError::Client)?;
        Ok(OriginBackend {
            name: self.name,
            client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_names_are_rejected_before_building_a_client() {
        match OriginBackend::builder("").finish() {
            Err(BackendCreationError::InvalidName(BackendError::EmptyName)) => {}
            x => panic!("unexpected result: {:?}", x),
        }
    }

    #[test]
    fn invalid_user_agent_is_rejected() {
        match OriginBackend::builder("origin").user_agent("bad\nagent").finish() {
            Err(BackendCreationError::InvalidUserAgent(_)) => {}
            x => panic!("unexpected result: {:?}", x),
        }
    }

    #[tokio::test]
    async fn unreachable_origin_is_a_send_error() {
        let origin = OriginBackend::builder("origin")
            .connect_timeout(Duration::from_millis(200))
            .timeout(Duration::from_millis(500))
            .finish()
            .unwrap();
        // port 9 (discard) on localhost is closed in any sane test environment
        let err = Request::get("http://127.0.0.1:9/")
            .send(&origin)
            .await
            .unwrap_err();
        assert_eq!(err.backend_name(), "origin");
        assert_eq!(err.into_sent_req().get_url_str(), "http://127.0.0.1:9/");
    }
}
