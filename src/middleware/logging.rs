//! Request logging middleware.
//!
//! # Responsibilities
//! - Assign each request an ID and a start time in its context
//! - Log `started` and `completed` events with structured fields
//! - Record request metrics
//!
//! # Design Decisions
//! - The ID source is injected, so independent applications can share one
//!   sequence or keep their own

use std::time::Instant;

use futures_util::future::BoxFuture;
use tracing::info;

use crate::http::context::{RequestContextExt, REQUEST_ID, START_AT};
use crate::http::{Next, Request, RequestCounter, Response};
use crate::middleware::descriptor::Middleware;
use crate::observability::metrics;

/// Header carrying the client address when running behind a load balancer.
pub const REMOTE_ADDR_HEADER: &str = "X-Cluster-Client-Ip";

pub(crate) fn remote_addr(req: &Request) -> String {
    req.headers()
        .get(REMOTE_ADDR_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Logs the start and completion of every request.
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    counter: RequestCounter,
}

impl RequestLogger {
    pub fn new(counter: RequestCounter) -> Self {
        Self { counter }
    }
}

impl Middleware for RequestLogger {
    fn handle<'a>(&'a self, mut req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let id = self.counter.next_id();
            let start = Instant::now();
            let method = req.method().to_string();
            let path = req.uri().path().to_string();
            let remote = remote_addr(&req);

            let ctx = req.context_mut();
            ctx.insert(REQUEST_ID, id);
            ctx.insert(START_AT, start);

            info!(action = "started", request = id, %method, %path, %remote);

            let res = next.run(req).await;
            let status = res.status();

            info!(
                action = "completed",
                request = id,
                %method,
                %path,
                %remote,
                duration_ms = start.elapsed().as_millis() as u64,
                status = status.as_u16(),
                outcome = status.canonical_reason().unwrap_or_default(),
            );
            metrics::record_request(&method, status.as_u16(), start);

            res
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::StatusCode;

    use super::*;
    use crate::http::{call, handler_fn, request_id};
    use crate::middleware::{compose, MiddlewareDescriptor};

    #[tokio::test]
    async fn test_assigns_sequential_ids() {
        let counter = RequestCounter::new();
        let logger = MiddlewareDescriptor::stateful(RequestLogger::new(counter.clone()));
        let echo = handler_fn(|req: Request| async move { request_id(&req).to_string() });
        let h = compose(&[logger], &[], echo).unwrap();

        for expected in ["1", "2"] {
            let res = call(h.clone(), Request::new(Body::empty())).await;
            assert_eq!(res.status(), StatusCode::OK);
            let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
            assert_eq!(body, expected);
        }
        assert_eq!(counter.next_id(), 3);
    }

    #[test]
    fn test_remote_addr_from_header() {
        let req = Request::builder()
            .header(REMOTE_ADDR_HEADER, "10.0.0.7")
            .body(Body::empty())
            .unwrap();
        assert_eq!(remote_addr(&req), "10.0.0.7");
        assert_eq!(remote_addr(&Request::new(Body::empty())), "");
    }
}
