//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route declaration (pattern, methods, version, handler, wrappers)
//!     → path.rs (versioned / unversioned / legacy path strings)
//!     → backend registration, one entry per path
//! ```
//!
//! # Design Decisions
//! - Routes are declarations only; matching belongs to the backend
//! - Path strings are computed once, at resolve time

pub mod method;
pub mod path;
pub mod route;

pub use method::{Method, MethodSet};
pub use path::{resolve_paths, PathContext};
pub use route::Route;
