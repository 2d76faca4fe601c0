use super::CacheError;
use crate::Response;
use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use time::OffsetDateTime;

/// An immutable capture of a successful response, as stored in a cache generation.
///
/// Snapshots are cheap to clone: the body is shared. Every read of a cached entry turns a snapshot
/// back into a fresh [`Response`] with [`to_response()`][Self::to_response()].
#[derive(Clone, Debug)]
pub struct ResponseSnapshot {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    stored_at: OffsetDateTime,
}

impl ResponseSnapshot {
    /// Capture a response for storage.
    ///
    /// Returns [`CacheError::NotCacheable`] unless the response status is `2xx`, so that error
    /// pages can never poison a generation.
    pub fn capture(resp: &Response) -> Result<Self, CacheError> {
        if !resp.is_ok() {
            return Err(CacheError::NotCacheable(resp.get_status()));
        }
        Ok(Self {
            status: resp.get_status(),
            version: resp.get_version(),
            headers: resp.get_header_map().clone(),
            body: resp
                .get_body()
                .map(|body| Bytes::copy_from_slice(body.as_bytes()))
                .unwrap_or_default(),
            stored_at: OffsetDateTime::now_utc(),
        })
    }

    /// Build a new response carrying the captured status, headers and body.
    pub fn to_response(&self) -> Response {
        let mut resp = Response::from_body(self.body.clone())
            .with_status(self.status)
            .with_version(self.version);
        resp.set_header_map(self.headers.clone());
        resp
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// When the snapshot was captured.
    pub fn stored_at(&self) -> OffsetDateTime {
        self.stored_at
    }

    /// How long ago the snapshot was captured.
    pub fn age(&self) -> time::Duration {
        OffsetDateTime::now_utc() - self.stored_at
    }

    /// Uppercase hex SHA-256 of the status and body.
    ///
    /// Two snapshots with equal digests serve the same content, regardless of when they were
    /// stored.
    pub fn digest(&self) -> String {
        let mut sha = Sha256::new();
        sha.update(self.status.as_u16().to_be_bytes());
        sha.update(&self.body);
        let mut hex = String::with_capacity(64);
        for b in sha.finalize() {
            write!(&mut hex, "{b:02X}").expect("writing to a String is infallible");
        }
        hex
    }
}
