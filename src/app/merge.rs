//! Merge engine.
//!
//! # Responsibilities
//! - Splice routes from source applications into a root application
//! - Assemble several applications into one backend without a root
//! - Detect duplicate prefixes and duplicate routes
//!
//! # Design Decisions
//! - Sources are consumed by `merge`; their routes move into the target
//! - A source's middleware and wrappers run ahead of each spliced route's own
//!   wrappers; an empty list adds nothing, so there is no separate branch for
//!   sources without middleware
//! - Duplicate routes are still appended so the caller sees the full table

use std::collections::HashSet;

use tracing::{info, warn};

use crate::app::Application;
use crate::backend::{BackendKind, RouterBackend};
use crate::error::{Error, ErrorList};
use crate::http::Handler;
use crate::middleware::{validate, MiddlewareDescriptor};

/// Middleware a source contributes to each of its routes.
fn source_chain(source: &Application) -> Vec<MiddlewareDescriptor> {
    source
        .middleware
        .iter()
        .chain(&source.wrappers)
        .cloned()
        .collect()
}

impl Application {
    /// Merge the routes of `apps` into this application.
    ///
    /// Only allowed once, on an unprefixed and unresolved application.
    /// Collisions are collected; the merge still completes.
    pub fn merge(&mut self, apps: impl IntoIterator<Item = Application>) -> Result<(), ErrorList> {
        if !self.prefix.is_empty() {
            return Err(Error::PrefixedMergeTarget.into());
        }
        if self.is_resolved {
            return Err(Error::AlreadyResolved.into());
        }
        if self.has_merged {
            return Err(Error::AlreadyMerged.into());
        }

        let apps: Vec<Application> = apps.into_iter().collect();
        if apps.is_empty() {
            return Err(Error::NoApplications.into());
        }

        let mut errors = ErrorList::new();
        let mut seen_prefixes = HashSet::new();
        let sources = apps.len();

        for source in apps {
            let chain = source_chain(&source);

            if !source.prefix.is_empty() {
                if !seen_prefixes.insert(source.prefix.clone()) {
                    warn!(prefix = %source.prefix, "duplicate prefix in merge");
                    errors.push(Error::DuplicatePrefix(source.prefix.clone()));
                    continue;
                }

                for mut route in source.routes {
                    let prefix = format!("{}{}", source.prefix, route.prefix());
                    route.set_prefix(&prefix);
                    route.prepend_wrappers(&chain);
                    self.routes.push(route);
                }
                continue;
            }

            let pin_version = source.default_version != self.default_version
                && source.default_version >= 0;

            for mut route in source.routes {
                if pin_version && route.version() == 0 {
                    route.set_version(source.default_version);
                }

                let duplicate = self.routes.iter().any(|existing| {
                    existing.prefix() == route.prefix()
                        && existing.collides_with(route.pattern(), route.version(), route.methods())
                });
                if duplicate {
                    warn!(route = %route, "duplicate route in merge");
                    errors.push(Error::DuplicateRoute {
                        pattern: route.pattern().to_string(),
                        version: route.version(),
                    });
                }

                route.prepend_wrappers(&chain);
                self.routes.push(route);
            }
        }

        self.has_merged = true;
        info!(
            sources,
            routes = self.routes.len(),
            errors = errors.len(),
            "applications merged"
        );
        errors.into_result()
    }
}

/// Combine `apps` into `backend` and return its dispatching handler.
///
/// Prefixed applications are mounted as sub-trees with their middleware
/// wrapping only that sub-tree. Unprefixed applications attach directly and
/// their middleware wraps the whole handler. Any error means no handler.
pub fn assemble(
    mut backend: Box<dyn RouterBackend>,
    apps: &[Application],
) -> Result<Handler, ErrorList> {
    let mut errors = ErrorList::new();
    let mut global = Vec::new();
    let mut seen_prefixes = HashSet::new();

    for app in apps {
        let invalid: Vec<Error> = validate("application middleware", &app.middleware)
            .into_iter()
            .chain(validate("application wrappers", &app.wrappers))
            .collect();
        if !invalid.is_empty() {
            errors.extend(invalid);
            continue;
        }

        if app.prefix.is_empty() {
            global.extend(app.middleware.iter().cloned());
            let (_, attach_errors) = app.attach_routes(&mut *backend, true);
            errors.extend(attach_errors);
            continue;
        }

        if !seen_prefixes.insert(app.prefix.as_str()) {
            errors.push(Error::DuplicatePrefix(app.prefix.clone()));
            continue;
        }

        let mut sub = backend.sub_router();
        let (_, attach_errors) = app.attach_routes(&mut *sub, false);
        errors.extend(attach_errors);

        match sub.as_handler(&app.middleware) {
            Ok(handler) => errors.add(backend.nest(&app.prefix, handler)),
            Err(err) => errors.push(err),
        }
    }

    errors.into_result()?;
    Ok(backend.as_handler(&global)?)
}

/// Assemble `apps` into a fresh backend of their shared kind.
///
/// Applications with an undefined backend adopt the kind of the others.
pub fn merge_applications(apps: &[Application]) -> Result<Handler, ErrorList> {
    let first = apps.first().ok_or(Error::NoApplications)?;

    let mut kind = BackendKind::Undefined;
    for (index, app) in apps.iter().enumerate() {
        if !app.router_kind.is_defined() {
            continue;
        }
        if !kind.is_defined() {
            kind = app.router_kind;
            continue;
        }
        if app.router_kind != kind {
            return Err(Error::MixedBackends {
                index,
                found: app.router_kind,
                expected: kind,
            }
            .into());
        }
    }

    let backend = kind.new_router(first.strict_slash)?;
    assemble(backend, apps)
}
