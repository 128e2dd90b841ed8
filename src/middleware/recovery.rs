//! Panic recovery middleware.

use std::panic::AssertUnwindSafe;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::error;

use crate::http::{request_id, Next, Request, Response};
use crate::middleware::descriptor::Middleware;
use crate::middleware::logging::remote_addr;

/// Turns a panic anywhere downstream into a `500` response.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recovery;

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Middleware for Recovery {
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let id = request_id(&req);
            let path = req.uri().path().to_string();
            let remote = remote_addr(&req);

            match AssertUnwindSafe(next.run(req)).catch_unwind().await {
                Ok(res) => res,
                Err(payload) => {
                    error!(
                        action = "aborted",
                        request = id,
                        %path,
                        %remote,
                        panic = %panic_message(payload.as_ref()),
                    );
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                        "internal server error",
                    )
                        .into_response()
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;
    use crate::http::{call, handler_fn};
    use crate::middleware::{compose, MiddlewareDescriptor};

    #[tokio::test]
    async fn test_panic_becomes_500() {
        let boom = handler_fn(|_req: Request| async move {
            if true {
                panic!("handler exploded");
            }
            "unreachable"
        });
        let h = compose(&[MiddlewareDescriptor::stateful(Recovery)], &[], boom).unwrap();

        let res = call(h, Request::new(Body::empty())).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_passes_through_normal_responses() {
        let ok = handler_fn(|_req: Request| async { "fine" });
        let h = compose(&[MiddlewareDescriptor::stateful(Recovery)], &[], ok).unwrap();
        assert_eq!(call(h, Request::new(Body::empty())).await.status(), StatusCode::OK);
    }

    #[test]
    fn test_panic_message_variants() {
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn std::any::Any + Send> = Box::new("borrowed");
        let other: Box<dyn std::any::Any + Send> = Box::new(5);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
