//! Hot-swappable handler.
//!
//! # Responsibilities
//! - Serve requests through whichever resolved handler is current
//! - Replace the handler atomically when a new route table is resolved
//!
//! # Design Decisions
//! - Lock-free reads via `ArcSwap`; each request works on the snapshot it loaded
//! - Resolution itself stays single-shot; reloading means resolving a new
//!   application and swapping its handler in

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use arc_swap::ArcSwap;
use futures_util::future::BoxFuture;
use tower::Service;

use crate::http::handler::{call, Handler, Request, Response};

/// A handler whose target can be replaced while requests are in flight.
#[derive(Clone)]
pub struct SharedHandler {
    current: Arc<ArcSwap<Handler>>,
}

impl SharedHandler {
    pub fn new(handler: Handler) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(handler)),
        }
    }

    /// Install a new handler; requests already dispatched keep the old one.
    pub fn replace(&self, handler: Handler) {
        self.current.store(Arc::new(handler));
        tracing::info!("request handler replaced");
    }

    /// A snapshot of the handler currently in use.
    pub fn load(&self) -> Handler {
        self.current.load().as_ref().clone()
    }

    /// Expose this shared handle as a plain [`Handler`].
    pub fn into_handler(self) -> Handler {
        Handler::new(self)
    }
}

impl Service<Request> for SharedHandler {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let handler = self.load();
        Box::pin(async move { Ok(call(handler, req).await) })
    }
}
