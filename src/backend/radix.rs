//! Lightweight radix-tree backend.
//!
//! # Responsibilities
//! - Map registered paths to method tables through a `matchit` router
//! - Dispatch requests: `404` on no match, `405` with `Allow` on a method miss
//! - Answer HEAD through GET routes, as axum does
//! - Apply middleware through its native `Stack`
//!
//! # Design Decisions
//! - One tree entry per path; methods for the same path share it
//! - A nested mount occupies both `prefix` and `prefix/{*rest}`
//! - The table is frozen into an `Arc` when the handler is built, so later
//!   registrations never affect a handler already serving requests

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::http::uri::PathAndQuery;
use axum::http::{self, header, HeaderValue, StatusCode, Uri};
use axum::response::IntoResponse;
use tower::service_fn;
use tracing::debug;

use crate::backend::{registration_path, BackendKind, Chain, RouterBackend};
use crate::error::Error;
use crate::http::{call, Handler, PathParams, Request, Response};
use crate::middleware::{MiddlewareDescriptor, Stack};
use crate::routing::{Method, MethodSet};

#[derive(Clone)]
enum Entry {
    Methods(BTreeMap<Method, Handler>),
    Nested { prefix: String, handler: Handler },
}

#[derive(Clone)]
struct Table {
    tree: matchit::Router<usize>,
    entries: Vec<Entry>,
    strict_slash: bool,
}

/// Radix mux backed by `matchit`.
#[derive(Clone)]
pub struct RadixBackend {
    table: Table,
    paths: HashMap<String, usize>,
}

fn conflict(path: &str, message: impl Into<String>) -> Error {
    Error::Registration {
        path: path.to_string(),
        message: message.into(),
    }
}

fn stack_for(scope: &str, middleware: &[&MiddlewareDescriptor]) -> Result<Stack, Error> {
    let mut stack = Stack::new();
    for (index, m) in middleware.iter().enumerate() {
        stack.push(m).map_err(|type_name| Error::InvalidMiddleware {
            scope: scope.to_string(),
            index,
            type_name: type_name.to_string(),
        })?;
    }
    Ok(stack)
}

impl RadixBackend {
    pub fn new(strict_slash: bool) -> Self {
        Self {
            table: Table {
                tree: matchit::Router::new(),
                entries: Vec::new(),
                strict_slash,
            },
            paths: HashMap::new(),
        }
    }

    fn insert(&mut self, path: &str, entry: usize) -> Result<(), Error> {
        self.table
            .tree
            .insert(path, entry)
            .map_err(|e| conflict(path, e.to_string()))?;
        self.paths.insert(path.to_string(), entry);
        Ok(())
    }
}

impl RouterBackend for RadixBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Radix
    }

    fn strict_slash(&self) -> bool {
        self.table.strict_slash
    }

    fn register(&mut self, path: &str, methods: &MethodSet, chain: Chain<'_>) -> Result<(), Error> {
        let path = registration_path(path, self.table.strict_slash);
        if methods.is_empty() {
            return Err(conflict(&path, "no methods"));
        }

        let layers: Vec<&MiddlewareDescriptor> = chain.outer.iter().chain(chain.inner).collect();
        let handler = stack_for("chain", &layers)?.then(chain.terminal);

        match self.paths.get(&path).copied() {
            Some(index) => {
                let Entry::Methods(table) = &mut self.table.entries[index] else {
                    return Err(conflict(&path, "path is occupied by a nested router"));
                };
                if let Some(m) = methods.iter().find(|m| table.contains_key(*m)) {
                    return Err(conflict(&path, format!("{} is already registered", m)));
                }
                for m in methods {
                    table.insert(*m, handler.clone());
                }
            }
            None => {
                let index = self.table.entries.len();
                self.insert(&path, index)?;
                let table = methods.iter().map(|m| (*m, handler.clone())).collect();
                self.table.entries.push(Entry::Methods(table));
            }
        }

        debug!(%path, backend = "radix", "registered route");
        Ok(())
    }

    fn nest(&mut self, prefix: &str, handler: Handler) -> Result<(), Error> {
        let prefix = registration_path(prefix, true);
        if prefix == "/" {
            return Err(conflict(&prefix, "cannot nest at the root"));
        }

        let index = self.table.entries.len();
        let catch_all = format!("{}/{{*rest}}", prefix);
        let mut probe = self.table.tree.clone();
        probe
            .insert(prefix.as_str(), index)
            .and_then(|_| probe.insert(catch_all.as_str(), index))
            .map_err(|e| conflict(&prefix, e.to_string()))?;

        self.table.tree = probe;
        self.paths.insert(prefix.clone(), index);
        self.paths.insert(catch_all, index);
        self.table.entries.push(Entry::Nested {
            prefix: prefix.clone(),
            handler,
        });

        debug!(%prefix, backend = "radix", "mounted sub-router");
        Ok(())
    }

    fn as_handler(&self, middleware: &[MiddlewareDescriptor]) -> Result<Handler, Error> {
        let table = Arc::new(self.table.clone());
        let dispatcher = Handler::new(service_fn(move |req: Request| {
            let table = table.clone();
            async move { Ok::<_, Infallible>(dispatch(table, req).await) }
        }));

        let layers: Vec<&MiddlewareDescriptor> = middleware.iter().collect();
        Ok(stack_for("application", &layers)?.then(dispatcher))
    }

    fn sub_router(&self) -> Box<dyn RouterBackend> {
        Box::new(Self::new(self.table.strict_slash))
    }
}

/// HEAD is served by the GET handler with the body dropped.
fn without_body(res: Response) -> Response {
    let (parts, _) = res.into_parts();
    Response::from_parts(parts, Body::empty())
}

fn method_not_allowed(allowed: &BTreeMap<Method, Handler>) -> Response {
    let mut allow = Vec::new();
    for m in allowed.keys() {
        allow.push(m.as_str());
        if *m == Method::Get {
            allow.push("HEAD");
        }
    }
    let mut res = StatusCode::METHOD_NOT_ALLOWED.into_response();
    if let Ok(value) = HeaderValue::from_str(&allow.join(",")) {
        res.headers_mut().insert(header::ALLOW, value);
    }
    res
}

/// Rewrite the request URI to drop `prefix` from its path.
fn strip_prefix(req: &mut Request, prefix: &str) {
    let uri = req.uri();
    let rest = uri.path().strip_prefix(prefix).unwrap_or_default();
    let rest = if rest.is_empty() { "/" } else { rest };
    let path_and_query = match uri.query() {
        Some(q) => format!("{}?{}", rest, q),
        None => rest.to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = path_and_query.parse::<PathAndQuery>().ok();
    if let Ok(stripped) = Uri::from_parts(parts) {
        *req.uri_mut() = stripped;
    }
}

async fn dispatch(table: Arc<Table>, mut req: Request) -> Response {
    let path = registration_path(req.uri().path(), table.strict_slash);

    let (index, params) = match table.tree.at(&path) {
        Ok(matched) => {
            let params: PathParams = matched.params.iter().collect();
            (*matched.value, params)
        }
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };

    match &table.entries[index] {
        Entry::Methods(handlers) => {
            let head = req.method() == http::Method::HEAD;
            let method = if head {
                Some(Method::Get)
            } else {
                Method::from_http(req.method())
            };
            match method.and_then(|m| handlers.get(&m)) {
                Some(handler) => {
                    req.extensions_mut().insert(params);
                    let res = call(handler.clone(), req).await;
                    if head {
                        without_body(res)
                    } else {
                        res
                    }
                }
                None => method_not_allowed(handlers),
            }
        }
        Entry::Nested { prefix, handler } => {
            strip_prefix(&mut req, prefix);
            call(handler.clone(), req).await
        }
    }
}
