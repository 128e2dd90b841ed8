//! HTTP plumbing shared by every other subsystem.
//!
//! # Data Flow
//! ```text
//! external listener
//!     → Handler (app middleware → router backend → route chain → terminal)
//!     → context.rs values set by middleware, read by handlers
//!     → Response
//! ```

pub mod context;
pub mod handler;
pub mod reload;
pub mod request;

pub use context::{path_params, ContextError, PathParams, RequestContext, RequestContextExt};
pub use handler::{call, from_func, handler_fn, into_func, Handler, HandlerFunc, Next, Request, Response};
pub use reload::SharedHandler;
pub use request::{request_id, RequestCounter};
