//! Backends: where requests go when the cache cannot answer them.
//!
//! Every caching strategy reaches the network through a [`Backend`]. The production
//! implementation is [`OriginBackend`], an HTTP client for the site origin and any third-party
//! hosts it calls. Tests and embedders can supply their own implementation, for example a scripted
//! fake that fails on demand.
mod origin;

pub use origin::*;

use crate::http::request::SendError;
use crate::{Request, Response};
use async_trait::async_trait;
use std::fmt;

/// The maximum length in characters of a backend name.
pub const MAX_BACKEND_NAME_LEN: usize = 255;

/// A destination that turns requests into responses, typically over the network.
///
/// Implementations must return `Err` only when no response at all could be obtained; an error
/// status such as `500` is a successful send and must be returned as a [`Response`]. The caching
/// strategies rely on this distinction: only `Err` triggers a fallback to the cache.
#[async_trait]
pub trait Backend: Send + Sync + fmt::Debug {
    /// The name of this backend, used in logs and in [`SendError`]s.
    fn name(&self) -> &str;

    /// Send the request and return the response.
    async fn send(&self, req: Request) -> Result<Response, SendError>;
}

/// Backend name errors.
#[derive(Copy, Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend name was empty.
    #[error("an empty string is not a valid backend")]
    EmptyName,
    /// The backend name was too long.
    #[error("backend names must be <= {} characters", MAX_BACKEND_NAME_LEN)]
    TooLong,
    /// The backend name contained a character other than visible ASCII or a space.
    #[error("backend names must only contain visible ASCII characters or spaces, found {0:?}")]
    InvalidName(char),
}

/// Check that a string can name a backend in logs and [`SendError`]s.
///
/// A name is non-empty, at most [`MAX_BACKEND_NAME_LEN`] characters long, and made of visible
/// ASCII characters and spaces only.
pub fn validate_backend(name: &str) -> Result<(), BackendError> {
    if name.is_empty() {
        return Err(BackendError::EmptyName);
    }
    if name.len() > MAX_BACKEND_NAME_LEN {
        return Err(BackendError::TooLong);
    }
    match name.chars().find(|&c| c != ' ' && !c.is_ascii_graphic()) {
        Some(c) => Err(BackendError::InvalidName(c)),
        None => Ok(()),
    }
}
