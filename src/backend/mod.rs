//! Router backends.
//!
//! # Responsibilities
//! - Select a backend implementation (`BackendKind`)
//! - Register composed handlers under concrete paths and methods
//! - Mount sub-trees under a prefix
//! - Produce the dispatching `Handler`
//!
//! # Backends
//! - `axum`: a full `axum::Router` with nested services; the middleware
//!   chain is composed into a single object before registration
//! - `radix`: a lightweight `matchit` mux that owns its dispatch loop and
//!   applies middleware through its native `Stack`
//!
//! # Design Decisions
//! - The engine only computes path strings and chains; matching, method
//!   dispatch and trailing-slash handling live here
//! - A backend never panics out of `register`/`nest`; conflicts surface as
//!   `Error::Registration`

pub mod axum_router;
pub mod radix;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::http::Handler;
use crate::middleware::MiddlewareDescriptor;
use crate::routing::MethodSet;

pub use axum_router::AxumBackend;
pub use radix::RadixBackend;

/// Which backend an application resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Axum,
    Radix,
    /// No usable backend selected; resolving fails.
    Undefined,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Axum => "axum",
            BackendKind::Radix => "radix",
            BackendKind::Undefined => "undefined",
        }
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, BackendKind::Undefined)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.is_defined() {
            Ok(())
        } else {
            Err(Error::InvalidBackend(*self))
        }
    }

    /// A fresh, empty backend of this kind.
    pub fn new_router(&self, strict_slash: bool) -> Result<Box<dyn RouterBackend>, Error> {
        match self {
            BackendKind::Axum => Ok(Box::new(AxumBackend::new(strict_slash))),
            BackendKind::Radix => Ok(Box::new(RadixBackend::new(strict_slash))),
            BackendKind::Undefined => Err(Error::InvalidBackend(*self)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "axum" => Ok(BackendKind::Axum),
            "radix" => Ok(BackendKind::Radix),
            _ => Err(Error::InvalidBackend(BackendKind::Undefined)),
        }
    }
}

/// The pieces of one route's handler chain, handed to `register`.
///
/// `outer` is the application's wrapper list, `inner` the route's own.
pub struct Chain<'a> {
    pub outer: &'a [MiddlewareDescriptor],
    pub inner: &'a [MiddlewareDescriptor],
    pub terminal: Handler,
}

/// A path-matching, method-dispatching router.
pub trait RouterBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn strict_slash(&self) -> bool;

    /// Register `chain` under `path` for every method in `methods`.
    fn register(&mut self, path: &str, methods: &MethodSet, chain: Chain<'_>) -> Result<(), Error>;

    /// Mount `handler` at `prefix`; it sees request paths with the prefix removed.
    fn nest(&mut self, prefix: &str, handler: Handler) -> Result<(), Error>;

    /// The dispatching handler, wrapped by `middleware` (outermost first).
    fn as_handler(&self, middleware: &[MiddlewareDescriptor]) -> Result<Handler, Error>;

    /// An empty backend of the same kind and slash policy.
    fn sub_router(&self) -> Box<dyn RouterBackend>;
}

/// The path actually registered, given the slash policy.
pub(crate) fn registration_path(path: &str, strict_slash: bool) -> String {
    if strict_slash && path.len() > 1 {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return "/".to_string();
        }
        return trimmed.to_string();
    }
    path.to_string()
}
