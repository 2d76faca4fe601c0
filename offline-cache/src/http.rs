//! HTTP types: requests, responses, and bodies.
//!
//! The header, method, status and version types are re-exported from the [`http`] crate.

pub mod body;
pub mod request;
pub mod response;

pub use self::body::Body;
pub use self::request::Request;
pub use self::response::Response;

pub use ::http::header::{self, HeaderName, HeaderValue};
pub use ::http::{HeaderMap, Method, StatusCode, Version};
