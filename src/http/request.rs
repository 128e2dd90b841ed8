//! Request identification.
//!
//! # Responsibilities
//! - Generate monotonically increasing request IDs
//! - Make the ID of the current request readable by handlers
//!
//! # Design Decisions
//! - The counter is an owned value injected into the logging middleware,
//!   not process-wide state; clones share one sequence
//! - IDs start at 1 so that 0 can mean "no ID assigned"

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::http::context::{RequestContextExt, REQUEST_ID};
use crate::http::Request;

/// Source of request IDs.
#[derive(Debug, Clone, Default)]
pub struct RequestCounter {
    next: Arc<AtomicU64>,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next ID in the sequence.
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// ID assigned to the request by the logging middleware, or 0.
pub fn request_id(req: &Request) -> u64 {
    req.context_value::<u64>(REQUEST_ID).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_ids_are_monotonic_and_shared() {
        let counter = RequestCounter::new();
        let clone = counter.clone();

        assert_eq!(counter.next_id(), 1);
        assert_eq!(clone.next_id(), 2);
        assert_eq!(counter.next_id(), 3);
    }

    #[test]
    fn test_request_id_defaults_to_zero() {
        let mut req = Request::new(Body::empty());
        assert_eq!(request_id(&req), 0);

        req.context_mut().insert(REQUEST_ID, 12_u64);
        assert_eq!(request_id(&req), 12);
    }
}
