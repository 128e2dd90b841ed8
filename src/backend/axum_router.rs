//! Backend over `axum::Router`.

use std::convert::Infallible;
use std::panic::{catch_unwind, AssertUnwindSafe};

use axum::extract::{FromRequestParts, RawPathParams};
use axum::routing::on_service;
use axum::Router;
use tower::service_fn;
use tower_http::normalize_path::NormalizePath;
use tracing::debug;

use crate::backend::{registration_path, BackendKind, Chain, RouterBackend};
use crate::error::Error;
use crate::http::{call, Handler, PathParams, Request};
use crate::middleware::{compose, MiddlewareDescriptor};
use crate::routing::method::method_filter;
use crate::routing::MethodSet;

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(payload) => match payload.downcast::<&str>() {
            Ok(s) => s.to_string(),
            Err(_) => "router panicked".to_string(),
        },
    }
}

/// Copy axum's matched parameters into a [`PathParams`] extension.
fn capture_path_params(handler: Handler) -> Handler {
    Handler::new(service_fn(move |req: Request| {
        let handler = handler.clone();
        async move {
            let (mut parts, body) = req.into_parts();
            if let Ok(raw) = RawPathParams::from_request_parts(&mut parts, &()).await {
                let params: PathParams = raw.iter().collect();
                parts.extensions.insert(params);
            }
            Ok::<_, Infallible>(call(handler, Request::from_parts(parts, body)).await)
        }
    }))
}

/// Full-featured router: nested sub-routers, method routing and
/// automatic `405` handling come from axum.
#[derive(Clone)]
pub struct AxumBackend {
    router: Router,
    strict_slash: bool,
}

impl AxumBackend {
    pub fn new(strict_slash: bool) -> Self {
        Self {
            router: Router::new(),
            strict_slash,
        }
    }

    /// Apply `f` to a copy of the router; a panic leaves the router untouched.
    fn try_update(&mut self, path: &str, f: impl FnOnce(Router) -> Router) -> Result<(), Error> {
        let current = self.router.clone();
        match catch_unwind(AssertUnwindSafe(|| f(current))) {
            Ok(router) => {
                self.router = router;
                Ok(())
            }
            Err(payload) => Err(Error::Registration {
                path: path.to_string(),
                message: panic_message(payload),
            }),
        }
    }
}

impl RouterBackend for AxumBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Axum
    }

    fn strict_slash(&self) -> bool {
        self.strict_slash
    }

    fn register(&mut self, path: &str, methods: &MethodSet, chain: Chain<'_>) -> Result<(), Error> {
        let path = registration_path(path, self.strict_slash);
        let Some(filter) = method_filter(methods) else {
            return Err(Error::Registration {
                path,
                message: "no methods".to_string(),
            });
        };

        let handler = compose(chain.outer, chain.inner, chain.terminal)?;
        let handler = capture_path_params(handler);
        self.try_update(&path, |router| router.route(&path, on_service(filter, handler)))?;

        debug!(%path, backend = "axum", "registered route");
        Ok(())
    }

    fn nest(&mut self, prefix: &str, handler: Handler) -> Result<(), Error> {
        self.try_update(prefix, |router| router.nest_service(prefix, handler))?;
        debug!(%prefix, backend = "axum", "mounted sub-router");
        Ok(())
    }

    fn as_handler(&self, middleware: &[MiddlewareDescriptor]) -> Result<Handler, Error> {
        let dispatcher = if self.strict_slash {
            Handler::new(NormalizePath::trim_trailing_slash(self.router.clone()))
        } else {
            Handler::new(self.router.clone())
        };
        compose(middleware, &[], dispatcher)
    }

    fn sub_router(&self) -> Box<dyn RouterBackend> {
        Box::new(Self::new(self.strict_slash))
    }
}
