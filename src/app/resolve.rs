//! Resolve/attach engine.
//!
//! # Algorithm
//! ```text
//! resolve:
//!   1. already resolved        → Ok, nothing changes
//!   2. backend selector        → fatal error, nothing attached
//!   3. app middleware/wrappers → all problems reported, nothing attached
//!   4. build backend
//!   5. per route: validate, resolve paths, validate wrappers
//!      (a bad route is skipped and reported; the rest still attach)
//!   6. register each path with (app wrappers, route wrappers)
//!   7. mark resolved, return collected errors
//! ```

use tracing::{debug, info, warn};

use crate::app::{Application, AttachedRoute};
use crate::backend::{Chain, RouterBackend};
use crate::error::{Error, ErrorList, RouteDefect};
use crate::http::Handler;
use crate::middleware::validate;
use crate::routing::{resolve_paths, Route};

impl Application {
    /// Attach every route to the backend.
    ///
    /// Per-route problems are collected and only skip the offending route.
    pub fn resolve(&mut self) -> Result<(), ErrorList> {
        if self.is_resolved {
            return Ok(());
        }

        self.router_kind.validate()?;

        let mut errors = ErrorList::new();
        errors.extend(validate("application middleware", &self.middleware));
        errors.extend(validate("application wrappers", &self.wrappers));
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut backend = match self.backend.take() {
            Some(backend) => backend,
            None => self.router_kind.new_router(self.strict_slash)?,
        };
        let (attached, errors) = self.attach_routes(&mut *backend, true);

        info!(
            prefix = %self.prefix,
            backend = %self.router_kind,
            routes = self.routes.len(),
            paths = attached.len(),
            errors = errors.len(),
            "application resolved"
        );

        self.backend = Some(backend);
        self.attached = attached;
        self.is_resolved = true;
        errors.into_result()
    }

    /// Register this application's routes with `backend`.
    ///
    /// `include_app_prefix` is false when the caller mounts the backend
    /// under the application's prefix itself.
    pub fn attach_routes(
        &self,
        backend: &mut dyn RouterBackend,
        include_app_prefix: bool,
    ) -> (Vec<AttachedRoute>, ErrorList) {
        let ctx = self.path_context();
        let mut attached = Vec::new();
        let mut errors = ErrorList::new();

        for route in &self.routes {
            let (handler, paths) = match check_route(route, || {
                resolve_paths(route, &ctx, include_app_prefix)
            }) {
                Ok(ok) => ok,
                Err(err) => {
                    warn!(route = %route, error = %err, "skipping route");
                    errors.push(err);
                    continue;
                }
            };

            let invalid = validate(&route.to_string(), route.wrappers());
            if !invalid.is_empty() {
                warn!(route = %route, errors = invalid.len(), "skipping route with invalid wrappers");
                errors.extend(invalid);
                continue;
            }

            for path in paths {
                let chain = Chain {
                    outer: &self.wrappers,
                    inner: route.wrappers(),
                    terminal: handler.clone(),
                };
                match backend.register(&path, route.methods(), chain) {
                    Ok(()) => {
                        debug!(%path, version = route.version(), "attached route");
                        attached.push(AttachedRoute {
                            path,
                            methods: route.methods().clone(),
                            version: route.version(),
                        });
                    }
                    Err(err) => {
                        warn!(%path, error = %err, "backend rejected route");
                        errors.push(err);
                    }
                }
            }
        }

        (attached, errors)
    }

    /// The application's dispatching handler, resolving first if needed.
    ///
    /// Errors from that first resolution are returned; the application is
    /// still resolved afterwards, so a later call yields a handler for the
    /// routes that did attach.
    pub fn handler(&mut self) -> Result<Handler, ErrorList> {
        self.resolve()?;
        let backend = self.backend()?;
        Ok(backend.as_handler(&self.middleware)?)
    }
}

fn check_route(
    route: &Route,
    paths: impl FnOnce() -> Result<Vec<String>, Error>,
) -> Result<(Handler, Vec<String>), Error> {
    let defect = |defect| Error::InvalidRoute {
        route: route.to_string(),
        defect,
    };

    if route.methods().is_empty() {
        return Err(defect(RouteDefect::NoMethods));
    }
    let handler = route.handler().ok_or_else(|| defect(RouteDefect::NoHandler))?;
    Ok((handler.clone(), paths()?))
}
