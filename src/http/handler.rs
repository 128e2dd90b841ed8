//! Handler types shared by routes, middleware and backends.
//!
//! # Responsibilities
//! - Define the boxed request handler every layer passes around
//! - Convert between the service form (`Handler`) and the function form (`HandlerFunc`)
//! - Provide `Next`, the continuation handed to stateful middleware
//!
//! # Design Decisions
//! - `Handler` is a `Clone + Send + Sync` tower service so a resolved tree can be
//!   shared across request tasks without locks
//! - Errors are `Infallible`: failures are expressed as HTTP responses

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use axum::response::IntoResponse;
use futures_util::future::BoxFuture;
use tower::util::BoxCloneSyncService;
use tower::{service_fn, ServiceExt};

pub use axum::extract::Request;
pub use axum::response::Response;

/// A request handler object: the unit routers register and middleware wraps.
pub type Handler = BoxCloneSyncService<Request, Response, Infallible>;

/// A request handler in plain function form.
pub type HandlerFunc = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Build a [`Handler`] from an async function.
///
/// ```rust,ignore
/// let hello = handler_fn(|_req| async { "hello" });
/// ```
pub fn handler_fn<F, Fut, R>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    Handler::new(service_fn(move |req: Request| {
        let fut = f(req);
        async move { Ok::<_, Infallible>(fut.await.into_response()) }
    }))
}

/// Drive a handler to completion for one request.
pub async fn call(handler: Handler, req: Request) -> Response {
    match handler.oneshot(req).await {
        Ok(res) => res,
        Err(never) => match never {},
    }
}

/// Expose a handler object as a plain function.
pub fn into_func(handler: Handler) -> HandlerFunc {
    Arc::new(move |req: Request| -> BoxFuture<'static, Response> {
        Box::pin(call(handler.clone(), req))
    })
}

/// Lift a plain function back into a handler object.
pub fn from_func(func: HandlerFunc) -> Handler {
    Handler::new(service_fn(move |req: Request| {
        let fut = func(req);
        async move { Ok::<_, Infallible>(fut.await) }
    }))
}

/// The remainder of a middleware chain.
#[derive(Clone)]
pub struct Next {
    inner: Handler,
}

impl Next {
    pub fn new(inner: Handler) -> Self {
        Self { inner }
    }

    /// Pass the request to the next element in the chain.
    pub async fn run(self, req: Request) -> Response {
        call(self.inner, req).await
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::StatusCode;

    async fn body_string(res: Response) -> String {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_handler_fn_converts_response() {
        let h = handler_fn(|_req| async { (StatusCode::CREATED, "made") });
        let res = call(h, Request::new(Body::empty())).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(body_string(res).await, "made");
    }

    #[tokio::test]
    async fn test_func_round_trip_preserves_behavior() {
        let h = handler_fn(|req: Request| async move { req.uri().path().to_string() });
        let back = from_func(into_func(h));
        let req = Request::builder().uri("/abc").body(Body::empty()).unwrap();
        assert_eq!(body_string(call(back, req).await).await, "/abc");
    }
}
