//! Versioned route registration, application merging and middleware
//! composition for JSON/HTTP services.
//!
//! Routes are declared on an [`Application`], resolved into concrete paths
//! against a router backend, and served through a single [`Handler`].

pub mod app;
pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod observability;
pub mod routing;

pub use app::{assemble, merge_applications, Application, AttachedRoute};
pub use backend::{BackendKind, RouterBackend};
pub use config::ServiceConfig;
pub use error::{Error, ErrorList};
pub use http::{handler_fn, Handler, Request, Response};
pub use middleware::MiddlewareDescriptor;
pub use routing::{Method, Route};
