//! Route declarations.
//!
//! # Responsibilities
//! - Hold one path-pattern-to-handler binding with its version and methods
//! - Carry the route's own middleware ("wrappers") and optional path prefix
//!
//! # Design Decisions
//! - Built as an owned value with chainable setters, then handed to an
//!   `Application`; once added it is no longer reachable mutably
//! - Validity (methods, handler, version) is checked at attach time, not here

use std::fmt;
use std::future::Future;

use axum::response::IntoResponse;

use crate::http::{handler_fn, Handler, Request};
use crate::middleware::MiddlewareDescriptor;
use crate::routing::method::{Method, MethodSet};

/// Give a path fragment exactly one leading `/` and no trailing one.
/// Empty and `/` both mean the root and become empty.
pub(crate) fn normalize_prefix(prefix: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() || prefix.starts_with('/') {
        prefix.to_string()
    } else {
        format!("/{}", prefix)
    }
}

/// A single route declaration.
#[derive(Clone)]
pub struct Route {
    pattern: String,
    methods: MethodSet,
    version: i32,
    handler: Option<Handler>,
    wrappers: Vec<MiddlewareDescriptor>,
    prefix: String,
    override_app_prefix: bool,
}

impl Route {
    /// Declare a route for `pattern`. The pattern always starts with `/`;
    /// the version starts out as -1 (unversioned).
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let pattern = if pattern.starts_with('/') {
            pattern
        } else {
            format!("/{}", pattern)
        };

        Self {
            pattern,
            methods: MethodSet::new(),
            version: -1,
            handler: None,
            wrappers: Vec::new(),
            prefix: String::new(),
            override_app_prefix: false,
        }
    }

    /// Set the version. Negative values mark a legacy (unversioned) route.
    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.methods.insert(method);
        self
    }

    pub fn get(self) -> Self {
        self.method(Method::Get)
    }

    pub fn put(self) -> Self {
        self.method(Method::Put)
    }

    pub fn post(self) -> Self {
        self.method(Method::Post)
    }

    pub fn delete(self) -> Self {
        self.method(Method::Delete)
    }

    pub fn patch(self) -> Self {
        self.method(Method::Patch)
    }

    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Set the handler from an async function.
    pub fn handler_fn<F, Fut, R>(self, f: F) -> Self
    where
        F: Fn(Request) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        self.with_handler(handler_fn(f))
    }

    /// Append route-scoped middleware; it runs closest to the handler.
    pub fn wrap(mut self, middleware: MiddlewareDescriptor) -> Self {
        self.wrappers.push(middleware);
        self
    }

    /// Give the route its own path prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = normalize_prefix(prefix);
        self
    }

    /// Resolve this route under its own prefix instead of the application's.
    pub fn override_app_prefix(mut self) -> Self {
        self.override_app_prefix = true;
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn methods(&self) -> &MethodSet {
        &self.methods
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.handler.as_ref()
    }

    pub fn wrappers(&self) -> &[MiddlewareDescriptor] {
        &self.wrappers
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn overrides_app_prefix(&self) -> bool {
        self.override_app_prefix
    }

    /// True for the same pattern and version with at least one method in common.
    pub fn collides_with(&self, pattern: &str, version: i32, methods: &MethodSet) -> bool {
        self.pattern == pattern
            && self.version == version
            && !self.methods.is_disjoint(methods)
    }

    pub(crate) fn set_version(&mut self, version: i32) {
        self.version = version;
    }

    pub(crate) fn set_prefix(&mut self, prefix: &str) {
        self.prefix = normalize_prefix(prefix);
    }

    /// Put `middleware` ahead of the route's own wrappers.
    pub(crate) fn prepend_wrappers(&mut self, middleware: &[MiddlewareDescriptor]) {
        if middleware.is_empty() {
            return;
        }
        let mut wrappers = middleware.to_vec();
        wrappers.append(&mut self.wrappers);
        self.wrappers = wrappers;
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
        write!(
            f,
            "'{}{}' (version {}, methods [{}])",
            self.prefix,
            self.pattern,
            self.version,
            methods.join(", ")
        )
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("methods", &self.methods)
            .field("version", &self.version)
            .field("has_handler", &self.handler.is_some())
            .field("wrappers", &self.wrappers.len())
            .field("prefix", &self.prefix)
            .field("override_app_prefix", &self.override_app_prefix)
            .finish()
    }
}
