//! Authentication middleware.
//!
//! # Responsibilities
//! - Attach a provider's authenticator and user manager to each request
//! - Reject requests without an authenticated user (`RequireAuth`) or
//!   without a given role (`RequireRole`)
//! - Resolve the request's user from a cookie token or API key headers
//!
//! # Design Decisions
//! - Everything travels through the request context; handlers read the user
//!   with `current_user`
//! - Any missing collaborator answers `401`, never a panic

use std::sync::Arc;

use axum::http::header::COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::auth::{Authenticator, Provider, SharedUser, UserManager};
use crate::http::context::{RequestContextExt, AUTHENTICATOR, USER, USER_MANAGER};
use crate::http::{Next, Request, Response};
use crate::middleware::descriptor::Middleware;

/// The authenticator attached by [`AuthenticationHandler`], if any.
pub fn authenticator(req: &Request) -> Option<Arc<dyn Authenticator>> {
    req.context_value::<Arc<dyn Authenticator>>(AUTHENTICATOR)
        .ok()
        .cloned()
}

/// The user manager attached by [`AuthenticationHandler`], if any.
pub fn user_manager(req: &Request) -> Option<Arc<dyn UserManager>> {
    req.context_value::<Arc<dyn UserManager>>(USER_MANAGER)
        .ok()
        .cloned()
}

/// The user resolved for this request, if any.
pub fn current_user(req: &Request) -> Option<SharedUser> {
    req.context_value::<SharedUser>(USER).ok().cloned()
}

fn unauthorized() -> Response {
    StatusCode::UNAUTHORIZED.into_response()
}

/// Attaches a provider's authenticator and user manager to the request context.
pub struct AuthenticationHandler {
    provider: Arc<dyn Provider>,
}

impl AuthenticationHandler {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

impl Middleware for AuthenticationHandler {
    fn handle<'a>(&'a self, mut req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let ctx = req.context_mut();
            if let Some(a) = self.provider.authenticator() {
                ctx.insert(AUTHENTICATOR, a);
            }
            if let Some(m) = self.provider.user_manager() {
                ctx.insert(USER_MANAGER, m);
            }
            next.run(req).await
        })
    }
}

/// Check the request's user with `check`; `None` means allowed.
fn reject_unless(req: &Request, check: impl Fn(&dyn Authenticator, SharedUser) -> bool) -> Option<Response> {
    let (Some(auth), Some(manager)) = (authenticator(req), user_manager(req)) else {
        return Some(unauthorized());
    };

    let user = match auth.user_from_request(manager.as_ref(), req) {
        Ok(user) => user,
        Err(err) => return Some((StatusCode::UNAUTHORIZED, err.to_string()).into_response()),
    };

    if check(auth.as_ref(), user) {
        None
    } else {
        Some(unauthorized())
    }
}

/// Only lets authenticated users through.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireAuth;

impl Middleware for RequireAuth {
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match reject_unless(&req, |auth, user| auth.check_authenticated(user.as_ref())) {
                Some(res) => res,
                None => next.run(req).await,
            }
        })
    }
}

/// Only lets users with access to `role` through.
#[derive(Debug, Clone)]
pub struct RequireRole {
    role: String,
}

impl RequireRole {
    pub fn new(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

impl Middleware for RequireRole {
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let role = self.role.as_str();
            match reject_unless(&req, |auth, user| auth.check_group_access(user.as_ref(), role)) {
                Some(res) => res,
                None => next.run(req).await,
            }
        })
    }
}

/// Where [`UserMiddleware`] looks for credentials.
#[derive(Debug, Clone)]
pub struct UserMiddlewareConfig {
    pub skip_cookie: bool,
    pub skip_header_check: bool,
    pub cookie_name: String,
    pub header_user_name: String,
    pub header_key_name: String,
}

impl Default for UserMiddlewareConfig {
    fn default() -> Self {
        Self {
            skip_cookie: false,
            skip_header_check: false,
            cookie_name: "auth-token".to_string(),
            header_user_name: "Api-User".to_string(),
            header_key_name: "Api-Key".to_string(),
        }
    }
}

fn cookie_value<'r>(req: &'r Request, name: &str) -> Option<&'r str> {
    req.headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v)
}

/// Query-style unescaping: `+` is a space, `%XX` an encoded byte.
fn unescape_token(raw: &str) -> Result<String, std::string::FromUtf8Error> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map(|token| token.into_owned())
}

fn header_value<'r>(req: &'r Request, name: &str) -> Option<&'r str> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Resolves the request's user and stores it in the context.
///
/// A cookie token is tried first; API key headers, when present, take
/// precedence and must match the user's key.
pub struct UserMiddleware {
    manager: Arc<dyn UserManager>,
    config: UserMiddlewareConfig,
}

impl UserMiddleware {
    pub fn new(manager: Arc<dyn UserManager>, config: UserMiddlewareConfig) -> Self {
        Self { manager, config }
    }

    fn user_from_cookie(&self, req: &Request) -> Option<SharedUser> {
        let raw = cookie_value(req, &self.config.cookie_name)?;
        let token = match unescape_token(raw) {
            Ok(token) => token,
            Err(err) => {
                debug!(error = %err, "malformed cookie token");
                return None;
            }
        };
        let user = match self.manager.user_by_token(&token) {
            Ok(user) => user,
            Err(err) => {
                debug!(error = %err, "no user for cookie token");
                return None;
            }
        };

        match self.manager.get_or_create_user(user.as_ref()) {
            Ok(user) => Some(user),
            Err(err) => {
                debug!(user = user.username(), error = %err, "error looking up user");
                None
            }
        }
    }
}

impl Middleware for UserMiddleware {
    fn handle<'a>(&'a self, mut req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if !self.config.skip_cookie {
                if let Some(user) = self.user_from_cookie(&req) {
                    req.context_mut().insert(USER, user);
                }
            }

            if !self.config.skip_header_check {
                let key = header_value(&req, &self.config.header_key_name).map(str::to_string);
                if let Some(key) = key {
                    let name = header_value(&req, &self.config.header_user_name)
                        .unwrap_or_default()
                        .to_string();
                    match self.manager.user_by_id(&name) {
                        Ok(user) if user.api_key() != key => {
                            return (StatusCode::UNAUTHORIZED, "Unauthorized - invalid API key")
                                .into_response();
                        }
                        Ok(user) => req.context_mut().insert(USER, user),
                        Err(err) => warn!(user = %name, error = %err, "error getting user"),
                    }
                }
            }

            next.run(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    #[test]
    fn test_cookie_token_is_unescaped() {
        assert_eq!(unescape_token("alice.1").unwrap(), "alice.1");
        assert_eq!(unescape_token("a%2Fb%3D%3D").unwrap(), "a/b==");
        assert_eq!(unescape_token("two+words").unwrap(), "two words");
        assert!(unescape_token("%FF").is_err());
    }

    #[test]
    fn test_cookie_value_picks_named_pair() {
        let req = Request::builder()
            .header(COOKIE, "theme=dark; auth-token=abc%2E1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(cookie_value(&req, "auth-token"), Some("abc%2E1"));
        assert_eq!(cookie_value(&req, "missing"), None);
    }
}
