//! Middleware descriptors.
//!
//! # Responsibilities
//! - Model the three supported middleware shapes as one closed type
//! - Carry unsupported values as data so resolution can report them
//!
//! # Shapes
//! - `Stateful`: an object with `handle(request, next)`, may hold state
//! - `FuncWrapper`: transforms a handler function into another handler function
//! - `HandlerWrapper`: transforms a handler object into another handler object
//!   (tower layers fit here)

use std::any::{type_name, Any};
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::response::IntoResponse;
use futures_util::future::BoxFuture;
use tower::{Layer, Service, ServiceExt};

use crate::http::{Handler, HandlerFunc, Next, Request, Response};

/// Middleware that sees the request and decides whether and how to call `next`.
pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response>;
}

/// Handler-function level wrapper.
pub type FuncWrapper = Arc<dyn Fn(HandlerFunc) -> HandlerFunc + Send + Sync>;

/// Handler-object level wrapper.
pub type HandlerWrapper = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// One element of a middleware list.
#[derive(Clone)]
pub enum MiddlewareDescriptor {
    Stateful(Arc<dyn Middleware>),
    FuncWrapper(FuncWrapper),
    HandlerWrapper(HandlerWrapper),
    /// A value of some other type; resolving an application that holds one fails.
    Unsupported { type_name: &'static str },
}

impl MiddlewareDescriptor {
    pub fn stateful<M: Middleware>(middleware: M) -> Self {
        Self::Stateful(Arc::new(middleware))
    }

    /// Stateful middleware from an async function, like `axum::middleware::from_fn`.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        Self::stateful(FromFn(f))
    }

    pub fn wrap_func<F>(f: F) -> Self
    where
        F: Fn(HandlerFunc) -> HandlerFunc + Send + Sync + 'static,
    {
        Self::FuncWrapper(Arc::new(f))
    }

    pub fn wrap_handler<F>(f: F) -> Self
    where
        F: Fn(Handler) -> Handler + Send + Sync + 'static,
    {
        Self::HandlerWrapper(Arc::new(f))
    }

    /// Adapt any tower layer whose service answers with something
    /// convertible into a response.
    pub fn layer<L, S, R>(layer: L) -> Self
    where
        L: Layer<Handler, Service = S> + Send + Sync + 'static,
        S: Service<Request, Response = R, Error = Infallible> + Clone + Send + Sync + 'static,
        S::Future: Send + 'static,
        R: IntoResponse + 'static,
    {
        Self::wrap_handler(move |inner| {
            Handler::new(layer.layer(inner).map_response(IntoResponse::into_response))
        })
    }

    /// Classify an arbitrary value. Descriptors, `Arc<dyn Middleware>`,
    /// `FuncWrapper` and `HandlerWrapper` values are recognized; anything
    /// else becomes `Unsupported`.
    pub fn from_value<T: Any + Send + Sync>(value: T) -> Self {
        let boxed: Box<dyn Any> = Box::new(value);
        let boxed = match boxed.downcast::<MiddlewareDescriptor>() {
            Ok(descriptor) => return *descriptor,
            Err(other) => other,
        };
        let boxed = match boxed.downcast::<Arc<dyn Middleware>>() {
            Ok(m) => return Self::Stateful(*m),
            Err(other) => other,
        };
        let boxed = match boxed.downcast::<FuncWrapper>() {
            Ok(w) => return Self::FuncWrapper(*w),
            Err(other) => other,
        };
        match boxed.downcast::<HandlerWrapper>() {
            Ok(w) => Self::HandlerWrapper(*w),
            Err(_) => Self::Unsupported {
                type_name: type_name::<T>(),
            },
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stateful(_) => "stateful middleware",
            Self::FuncWrapper(_) => "handler function wrapper",
            Self::HandlerWrapper(_) => "handler wrapper",
            Self::Unsupported { type_name } => type_name,
        }
    }
}

impl fmt::Debug for MiddlewareDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MiddlewareDescriptor({})", self.kind())
    }
}

struct FromFn<F>(F);

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin((self.0)(req, next))
    }
}
