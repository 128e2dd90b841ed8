//! Middleware subsystem.
//!
//! # Data Flow
//! ```text
//! MiddlewareDescriptor (stateful | function wrapper | handler wrapper)
//!     → chain.rs (validate, compose around a terminal handler)
//!     → Handler
//! ```
//!
//! # Design Decisions
//! - A closed enum of shapes, dispatched exhaustively when composing
//! - Values of any other type are carried as `Unsupported` and reported at
//!   resolve time rather than rejected by the type system at the call site
//! - Built-ins (logging, recovery, auth) are ordinary stateful middleware

pub mod auth;
pub mod chain;
pub mod descriptor;
pub mod logging;
pub mod recovery;

pub use auth::{
    current_user, AuthenticationHandler, RequireAuth, RequireRole, UserMiddleware,
    UserMiddlewareConfig,
};
pub use chain::{compose, validate, Stack};
pub use descriptor::{FuncWrapper, HandlerWrapper, Middleware, MiddlewareDescriptor};
pub use logging::RequestLogger;
pub use recovery::Recovery;
