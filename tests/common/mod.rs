//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::Router;
use futures_util::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use switchyard::http::{call, Next};
use switchyard::middleware::Middleware;
use switchyard::{handler_fn, Handler, MiddlewareDescriptor, Request, Response, Route};

/// Ordered record of middleware and handler activity.
pub type Trace = Arc<Mutex<Vec<String>>>;

pub fn trace() -> Trace {
    Arc::default()
}

pub fn entries(trace: &Trace) -> Vec<String> {
    trace.lock().unwrap().clone()
}

struct Record {
    name: String,
    trace: Trace,
}

impl Middleware for Record {
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            self.trace.lock().unwrap().push(format!("{} in", self.name));
            let res = next.run(req).await;
            self.trace.lock().unwrap().push(format!("{} out", self.name));
            res
        })
    }
}

/// Middleware that records `"<name> in"` and `"<name> out"`.
pub fn recording(name: &str, trace: &Trace) -> MiddlewareDescriptor {
    MiddlewareDescriptor::stateful(Record {
        name: name.to_string(),
        trace: trace.clone(),
    })
}

/// Handler that answers with `body` and records `"handler"`.
pub fn traced_handler(body: &'static str, trace: &Trace) -> Handler {
    let trace = trace.clone();
    handler_fn(move |_req: Request| {
        let trace = trace.clone();
        async move {
            trace.lock().unwrap().push("handler".to_string());
            body
        }
    })
}

/// A GET route answering with `body`.
pub fn get_route(pattern: &str, version: i32, body: &'static str) -> Route {
    Route::new(pattern)
        .with_version(version)
        .get()
        .handler_fn(move |_req: Request| async move { body })
}

pub fn request(method: &str, uri: &str) -> Request {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_string(res: Response) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Send one request through `handler`; returns status code and body.
pub async fn send(handler: &Handler, method: &str, uri: &str) -> (u16, String) {
    let res = call(handler.clone(), request(method, uri)).await;
    let status = res.status().as_u16();
    (status, body_string(res).await)
}

/// Serve `handler` on an ephemeral local port.
pub async fn serve(handler: Handler) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback_service(handler);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Issue a raw HTTP/1.1 GET and return the full response text.
pub async fn raw_get(addr: SocketAddr, path: &str) -> String {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, addr
    );
    socket.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    socket.read_to_string(&mut response).await.unwrap();
    response
}
