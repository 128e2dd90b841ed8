//! Request metrics.
//!
//! # Responsibilities
//! - Record per-request counters and latency through the `metrics` facade
//!
//! # Metrics
//! - `switchyard_requests_total` (counter): requests by method, status
//! - `switchyard_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - No exporter is installed here; with no recorder set, recording is a no-op
//! - Labels are limited to method and status to keep cardinality bounded

use std::time::Instant;

pub const REQUESTS_TOTAL: &str = "switchyard_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "switchyard_request_duration_seconds";

/// Record one completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();

    metrics::counter!(REQUESTS_TOTAL, "method" => method.to_string(), "status" => status.clone())
        .increment(1);
    metrics::histogram!(REQUEST_DURATION_SECONDS, "method" => method.to_string(), "status" => status)
        .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_request("GET", 200, Instant::now());
    }
}
