//! Request-scoped values.
//!
//! # Responsibilities
//! - Carry values set by middleware (request id, start time, auth objects, user)
//!   down to handlers
//! - Expose matched path parameters regardless of router backend
//!
//! # Design Decisions
//! - Stored in the request's `http::Extensions`, so it travels with the request
//!   through every layer without ambient globals
//! - Typed lookups distinguish "absent" from "present with another type"

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::http::Request;

pub const REQUEST_ID: &str = "request-id";
pub const START_AT: &str = "start-at";
pub const AUTHENTICATOR: &str = "authenticator";
pub const USER_MANAGER: &str = "user-manager";
pub const USER: &str = "user";

/// Failure to read a value from a [`RequestContext`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("no value for '{0}' in request context")]
    Missing(String),

    #[error("value for '{key}' is not a {expected}")]
    WrongType { key: String, expected: &'static str },
}

/// A string-keyed map of request-scoped values.
#[derive(Clone, Default)]
pub struct RequestContext {
    values: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Arc::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Result<&T, ContextError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ContextError::Missing(key.to_string()))?;

        value.downcast_ref::<T>().ok_or_else(|| ContextError::WrongType {
            key: key.to_string(),
            expected: type_name::<T>(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Accessors for the [`RequestContext`] attached to a request.
pub trait RequestContextExt {
    fn context(&self) -> Option<&RequestContext>;

    /// The request's context, created on first use.
    fn context_mut(&mut self) -> &mut RequestContext;

    fn context_value<T: Any + Send + Sync>(&self, key: &str) -> Result<&T, ContextError>;
}

impl RequestContextExt for Request {
    fn context(&self) -> Option<&RequestContext> {
        self.extensions().get::<RequestContext>()
    }

    fn context_mut(&mut self) -> &mut RequestContext {
        self.extensions_mut().get_or_insert_default::<RequestContext>()
    }

    fn context_value<T: Any + Send + Sync>(&self, key: &str) -> Result<&T, ContextError> {
        match self.context() {
            Some(ctx) => ctx.get(key),
            None => Err(ContextError::Missing(key.to_string())),
        }
    }
}

/// Path parameters captured by the router for the matched route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Path parameters for the request, empty when none were captured.
pub fn path_params(req: &Request) -> PathParams {
    req.extensions()
        .get::<PathParams>()
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_missing_and_wrong_type_are_distinct() {
        let mut ctx = RequestContext::new();
        ctx.insert(REQUEST_ID, 7_u64);

        assert_eq!(ctx.get::<u64>(REQUEST_ID), Ok(&7));
        assert_eq!(
            ctx.get::<u64>(USER),
            Err(ContextError::Missing(USER.to_string()))
        );
        assert!(matches!(
            ctx.get::<String>(REQUEST_ID),
            Err(ContextError::WrongType { .. })
        ));
    }

    #[test]
    fn test_request_extension_accessors() {
        let mut req = Request::new(Body::empty());
        assert!(req.context().is_none());
        assert!(matches!(
            req.context_value::<u64>(REQUEST_ID),
            Err(ContextError::Missing(_))
        ));

        req.context_mut().insert(REQUEST_ID, 3_u64);
        req.context_mut().insert(USER, "alice".to_string());

        assert_eq!(req.context_value::<u64>(REQUEST_ID), Ok(&3));
        assert_eq!(req.context().map(RequestContext::len), Some(2));
    }

    #[test]
    fn test_path_params_last_write_wins() {
        let params: PathParams = vec![("id", "1"), ("name", "x"), ("id", "2")]
            .into_iter()
            .collect();
        assert_eq!(params.get("id"), Some("2"));
        assert_eq!(params.get("name"), Some("x"));
        assert_eq!(params.get("missing"), None);
    }
}
