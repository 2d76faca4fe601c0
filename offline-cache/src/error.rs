//! Error-handling utilities.
//!
//! Each concern has its own error enum, re-exported here. [`Error`] is the catch-all used by the
//! hooks the hosting environment implements ([`Host`][crate::host::Host],
//! [`SyncHook`][crate::sync::SyncHook]).

pub use crate::backend::{BackendCreationError, BackendError};
pub use crate::cache::{CacheError, PrecacheError};
pub use crate::config::ConfigError;
pub use crate::http::request::{SendError, SendErrorCause};
pub use crate::lifecycle::LifecycleError;
pub use crate::registration::RegisterError;
pub use crate::worker::{ActivateError, BuildError, InstallError};
pub use anyhow::{anyhow, bail, ensure, Context, Error};
