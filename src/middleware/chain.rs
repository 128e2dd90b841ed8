//! Middleware chain builder.
//!
//! # Responsibilities
//! - Wrap a terminal handler with an ordered list of descriptors
//! - Dispatch each descriptor by shape (stateful, function wrapper, handler wrapper)
//! - Report unsupported descriptors instead of dropping them
//!
//! # Ordering
//! ```text
//! outer = [A, B], inner = [C, D]
//! request  → A → B → C → D → terminal
//! response ← A ← B ← C ← D ← terminal
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use tower::service_fn;

use crate::error::Error;
use crate::http::{from_func, into_func, Handler, Next, Request};
use crate::middleware::descriptor::{HandlerWrapper, Middleware, MiddlewareDescriptor};

fn unsupported(scope: &str, index: usize, type_name: &str) -> Error {
    Error::InvalidMiddleware {
        scope: scope.to_string(),
        index,
        type_name: type_name.to_string(),
    }
}

/// Every unsupported descriptor in `middleware`, labelled with `scope`.
pub fn validate(scope: &str, middleware: &[MiddlewareDescriptor]) -> Vec<Error> {
    middleware
        .iter()
        .enumerate()
        .filter_map(|(index, m)| match m {
            MiddlewareDescriptor::Unsupported { type_name } => {
                Some(unsupported(scope, index, type_name))
            }
            _ => None,
        })
        .collect()
}

fn stateful(middleware: Arc<dyn Middleware>, next: Handler) -> Handler {
    Handler::new(service_fn(move |req: Request| {
        let middleware = middleware.clone();
        let next = Next::new(next.clone());
        async move { Ok::<_, Infallible>(middleware.handle(req, next).await) }
    }))
}

/// Turn one descriptor into a handler-to-handler wrapper.
pub fn to_handler_wrapper(descriptor: &MiddlewareDescriptor) -> Option<HandlerWrapper> {
    match descriptor {
        MiddlewareDescriptor::Stateful(m) => {
            let m = m.clone();
            let wrapper: HandlerWrapper = Arc::new(move |next: Handler| stateful(m.clone(), next));
            Some(wrapper)
        }
        MiddlewareDescriptor::FuncWrapper(w) => {
            let w = w.clone();
            let wrapper: HandlerWrapper =
                Arc::new(move |next: Handler| from_func(w(into_func(next))));
            Some(wrapper)
        }
        MiddlewareDescriptor::HandlerWrapper(w) => Some(w.clone()),
        MiddlewareDescriptor::Unsupported { .. } => None,
    }
}

/// Wrap `terminal` with `outer` followed by `inner`; the first element runs first.
///
/// With both lists empty the terminal handler comes back as-is.
pub fn compose(
    outer: &[MiddlewareDescriptor],
    inner: &[MiddlewareDescriptor],
    terminal: Handler,
) -> Result<Handler, Error> {
    if outer.is_empty() && inner.is_empty() {
        return Ok(terminal);
    }

    let mut stack = Stack::new();
    for (index, m) in outer.iter().chain(inner).enumerate() {
        stack.push(m).map_err(|type_name| unsupported("chain", index, type_name))?;
    }
    Ok(stack.then(terminal))
}

/// An ordered stack of handler wrappers applied around a handler on demand.
#[derive(Clone, Default)]
pub struct Stack {
    layers: Vec<HandlerWrapper>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor. On failure the descriptor's type name is returned.
    pub fn push(&mut self, descriptor: &MiddlewareDescriptor) -> Result<(), &'static str> {
        match to_handler_wrapper(descriptor) {
            Some(wrapper) => {
                self.layers.push(wrapper);
                Ok(())
            }
            None => Err(descriptor.kind()),
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Wrap `handler`; the first pushed element ends up outermost.
    pub fn then(&self, handler: Handler) -> Handler {
        self.layers
            .iter()
            .rev()
            .fold(handler, |inner, wrap| wrap(inner))
    }
}
