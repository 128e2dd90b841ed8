//! Path resolution for routes.
//!
//! # Responsibilities
//! - Compute the concrete registration path(s) for a route
//! - Render the version segment (`/v2` or `/2`)
//! - Reject unversioned routes in applications that do not allow them
//!
//! # Design Decisions
//! - Pure functions over a `PathContext` snapshot of the owning application
//! - Trailing-slash equivalence is left to the backend, so no slash variants
//!   are produced here
//!
//! # Path Families
//! ```text
//! version >= 0   prefix + /v{N} + route prefix + pattern
//!                plus prefix + route prefix + pattern when N == 0 or N == default
//! version <  0   prefix + route prefix + pattern (legacy apps only)
//! ```

use crate::error::{Error, RouteDefect};
use crate::routing::route::Route;

/// The application settings that influence path resolution.
#[derive(Debug, Clone, Copy)]
pub struct PathContext<'a> {
    pub prefix: &'a str,
    pub default_version: i32,
    pub allow_legacy_routes: bool,
    pub simple_versions: bool,
}

impl Default for PathContext<'_> {
    fn default() -> Self {
        Self {
            prefix: "",
            default_version: -1,
            allow_legacy_routes: false,
            simple_versions: false,
        }
    }
}

fn route_prefix<'a>(route: &'a Route, ctx: &PathContext<'a>, include_app_prefix: bool) -> &'a str {
    if !include_app_prefix {
        return "";
    }

    if route.overrides_app_prefix() && !route.prefix().is_empty() {
        return route.prefix();
    }

    ctx.prefix
}

fn version_segment(version: i32, simple_versions: bool) -> String {
    if simple_versions {
        format!("/{}", version)
    } else {
        format!("/v{}", version)
    }
}

/// Join path fragments, dropping a bare `/` pattern when something precedes it.
fn join(parts: &[&str]) -> String {
    let mut out = String::new();
    let last = parts.len().saturating_sub(1);
    for (i, part) in parts.iter().enumerate() {
        if i == last && *part == "/" && !out.is_empty() {
            continue;
        }
        out.push_str(part);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Resolve every path `route` should be registered under.
///
/// Returns `InvalidRoute` when the route is unversioned and the application
/// does not allow legacy routes; the caller skips only that route.
pub fn resolve_paths(
    route: &Route,
    ctx: &PathContext<'_>,
    include_app_prefix: bool,
) -> Result<Vec<String>, Error> {
    let prefix = route_prefix(route, ctx, include_app_prefix);
    let remainder = if route.prefix() != prefix && !route.prefix().is_empty() {
        route.prefix()
    } else {
        ""
    };

    let version = route.version();
    if version >= 0 {
        let segment = version_segment(version, ctx.simple_versions);
        let mut paths = vec![join(&[prefix, &segment, remainder, route.pattern()])];
        if version == 0 || version == ctx.default_version {
            paths.push(join(&[prefix, remainder, route.pattern()]));
        }
        return Ok(paths);
    }

    if ctx.allow_legacy_routes {
        return Ok(vec![join(&[prefix, remainder, route.pattern()])]);
    }

    Err(Error::InvalidRoute {
        route: route.to_string(),
        defect: RouteDefect::Unversioned(version),
    })
}
