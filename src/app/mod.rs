//! Application registry.
//!
//! # Responsibilities
//! - Own an ordered list of routes plus application-wide middleware
//! - Hold the settings that shape path resolution (prefix, versions, slashes)
//! - Freeze everything once resolved
//!
//! # Lifecycle
//! ```text
//! new / with_defaults / from_config
//!     → add_route, add_middleware, add_wrapper, setters
//!     → merge (optional, once)
//!     → resolve (resolve.rs) → handler
//! ```
//!
//! # Design Decisions
//! - Every mutator returns `Result<&mut Self, Error>` so calls chain with `?`
//!   and are rejected with `AlreadyResolved` after resolution
//! - Routes are moved in by value; once added they cannot be reached mutably

mod merge;
mod resolve;

use std::fmt;

use crate::backend::{BackendKind, RouterBackend};
use crate::config::AppConfig;
use crate::error::Error;
use crate::http::RequestCounter;
use crate::middleware::{MiddlewareDescriptor, Recovery, RequestLogger};
use crate::routing::route::normalize_prefix;
use crate::routing::{MethodSet, PathContext, Route};

pub use merge::{assemble, merge_applications};

/// A path registered with the backend during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedRoute {
    pub path: String,
    pub methods: MethodSet,
    pub version: i32,
}

/// A mountable collection of routes, middleware and settings.
pub struct Application {
    routes: Vec<Route>,
    middleware: Vec<MiddlewareDescriptor>,
    wrappers: Vec<MiddlewareDescriptor>,
    prefix: String,
    default_version: i32,
    strict_slash: bool,
    allow_legacy_routes: bool,
    simple_versions: bool,
    router_kind: BackendKind,
    host: String,
    port: u16,
    is_resolved: bool,
    has_merged: bool,
    backend: Option<Box<dyn RouterBackend>>,
    attached: Vec<AttachedRoute>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// An empty application: no middleware, no default version, strict
    /// slashes, axum backend, port 3000.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            middleware: Vec::new(),
            wrappers: Vec::new(),
            prefix: String::new(),
            default_version: -1,
            strict_slash: true,
            allow_legacy_routes: false,
            simple_versions: false,
            router_kind: BackendKind::Axum,
            host: String::new(),
            port: 3000,
            is_resolved: false,
            has_merged: false,
            backend: None,
            attached: Vec::new(),
        }
    }

    /// An application with panic recovery and request logging installed.
    pub fn with_defaults() -> Self {
        let mut app = Self::new();
        app.middleware.push(MiddlewareDescriptor::stateful(Recovery));
        app.middleware
            .push(MiddlewareDescriptor::stateful(RequestLogger::new(RequestCounter::new())));
        app
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let mut app = Self::new();
        app.set_prefix(&config.prefix)?
            .set_strict_slash(config.strict_slash)?
            .set_allow_legacy_routes(config.allow_legacy_routes)?
            .set_simple_versions(config.simple_versions)?
            .set_router(config.router)?
            .set_host(&config.host)?
            .set_port(config.port)?;
        if config.default_version >= 0 {
            app.set_default_version(config.default_version)?;
        }
        Ok(app)
    }

    fn ensure_unresolved(&self) -> Result<(), Error> {
        if self.is_resolved {
            Err(Error::AlreadyResolved)
        } else {
            Ok(())
        }
    }

    pub fn add_route(&mut self, route: Route) -> Result<&mut Self, Error> {
        self.ensure_unresolved()?;
        self.routes.push(route);
        Ok(self)
    }

    /// Append application-wide middleware; it runs for every request,
    /// outermost first.
    pub fn add_middleware(&mut self, middleware: MiddlewareDescriptor) -> Result<&mut Self, Error> {
        self.ensure_unresolved()?;
        self.middleware.push(middleware);
        Ok(self)
    }

    /// Append a wrapper: middleware applied around each route's handler,
    /// outside the route's own wrappers.
    pub fn add_wrapper(&mut self, wrapper: MiddlewareDescriptor) -> Result<&mut Self, Error> {
        self.ensure_unresolved()?;
        self.wrappers.push(wrapper);
        Ok(self)
    }

    /// Remove every application-wide middleware.
    pub fn reset_middleware(&mut self) -> Result<&mut Self, Error> {
        self.ensure_unresolved()?;
        self.middleware.clear();
        Ok(self)
    }

    pub fn set_prefix(&mut self, prefix: &str) -> Result<&mut Self, Error> {
        self.ensure_unresolved()?;
        self.prefix = normalize_prefix(prefix);
        Ok(self)
    }

    pub fn set_default_version(&mut self, version: i32) -> Result<&mut Self, Error> {
        self.ensure_unresolved()?;
        if version < 0 {
            return Err(Error::InvalidVersion(version));
        }
        self.default_version = version;
        Ok(self)
    }

    pub fn set_strict_slash(&mut self, strict: bool) -> Result<&mut Self, Error> {
        self.ensure_unresolved()?;
        self.strict_slash = strict;
        Ok(self)
    }

    pub fn set_allow_legacy_routes(&mut self, allow: bool) -> Result<&mut Self, Error> {
        self.ensure_unresolved()?;
        self.allow_legacy_routes = allow;
        Ok(self)
    }

    pub fn set_simple_versions(&mut self, simple: bool) -> Result<&mut Self, Error> {
        self.ensure_unresolved()?;
        self.simple_versions = simple;
        Ok(self)
    }

    pub fn set_router(&mut self, kind: BackendKind) -> Result<&mut Self, Error> {
        self.ensure_unresolved()?;
        self.router_kind = kind;
        Ok(self)
    }

    pub fn set_host(&mut self, host: &str) -> Result<&mut Self, Error> {
        self.ensure_unresolved()?;
        self.host = host.to_string();
        Ok(self)
    }

    /// Ports below 1024 are refused.
    pub fn set_port(&mut self, port: u16) -> Result<&mut Self, Error> {
        self.ensure_unresolved()?;
        if port < 1024 {
            return Err(Error::InvalidPort(port));
        }
        self.port = port;
        Ok(self)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn middleware(&self) -> &[MiddlewareDescriptor] {
        &self.middleware
    }

    pub fn wrappers(&self) -> &[MiddlewareDescriptor] {
        &self.wrappers
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn default_version(&self) -> i32 {
        self.default_version
    }

    pub fn strict_slash(&self) -> bool {
        self.strict_slash
    }

    pub fn allow_legacy_routes(&self) -> bool {
        self.allow_legacy_routes
    }

    pub fn simple_versions(&self) -> bool {
        self.simple_versions
    }

    pub fn router_kind(&self) -> BackendKind {
        self.router_kind
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` to listen on.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_resolved(&self) -> bool {
        self.is_resolved
    }

    pub fn has_merged(&self) -> bool {
        self.has_merged
    }

    /// Paths registered by `resolve`, in registration order.
    pub fn attached_routes(&self) -> &[AttachedRoute] {
        &self.attached
    }

    /// The backend built by `resolve`.
    pub fn backend(&self) -> Result<&dyn RouterBackend, Error> {
        match &self.backend {
            Some(backend) if self.is_resolved => Ok(&**backend),
            _ => Err(Error::NotResolved),
        }
    }

    pub fn path_context(&self) -> PathContext<'_> {
        PathContext {
            prefix: &self.prefix,
            default_version: self.default_version,
            allow_legacy_routes: self.allow_legacy_routes,
            simple_versions: self.simple_versions,
        }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("prefix", &self.prefix)
            .field("routes", &self.routes.len())
            .field("middleware", &self.middleware.len())
            .field("wrappers", &self.wrappers.len())
            .field("default_version", &self.default_version)
            .field("router", &self.router_kind)
            .field("resolved", &self.is_resolved)
            .field("merged", &self.has_merged)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let app = Application::new();
        assert_eq!(app.default_version(), -1);
        assert!(app.strict_slash());
        assert_eq!(app.port(), 3000);
        assert_eq!(app.router_kind(), BackendKind::Axum);
        assert!(app.middleware().is_empty());
        assert_eq!(Application::with_defaults().middleware().len(), 2);
    }

    #[test]
    fn test_setters_validate() {
        let mut app = Application::new();
        app.set_prefix("api").unwrap();
        assert_eq!(app.prefix(), "/api");

        assert_eq!(app.set_default_version(-2).unwrap_err(), Error::InvalidVersion(-2));
        assert_eq!(app.set_port(80).unwrap_err(), Error::InvalidPort(80));
        app.set_port(8080).unwrap().set_host("localhost").unwrap();
        assert_eq!(app.address(), "localhost:8080");
    }

    #[test]
    fn test_reset_middleware() {
        let mut app = Application::with_defaults();
        app.reset_middleware().unwrap();
        assert!(app.middleware().is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = AppConfig {
            prefix: "svc".to_string(),
            default_version: 2,
            router: BackendKind::Radix,
            ..AppConfig::default()
        };
        let app = Application::from_config(&config).unwrap();
        assert_eq!(app.prefix(), "/svc");
        assert_eq!(app.default_version(), 2);
        assert_eq!(app.router_kind(), BackendKind::Radix);

        let bad = AppConfig {
            port: 10,
            ..AppConfig::default()
        };
        assert_eq!(Application::from_config(&bad).unwrap_err(), Error::InvalidPort(10));
    }

    #[test]
    fn test_backend_requires_resolution() {
        let app = Application::new();
        assert!(matches!(app.backend(), Err(Error::NotResolved)));
    }
}
