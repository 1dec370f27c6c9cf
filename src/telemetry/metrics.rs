//! Metric instrument factories for foia-dispatch.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"foia-dispatch"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for foia-dispatch instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("foia-dispatch")
}

/// Counter: delivery attempts.
/// Labels: `result`, the status after the attempt ("queued" for a retry).
pub fn submission_attempts() -> Counter<u64> {
    meter()
        .u64_counter("foia.submission.attempts")
        .with_description("Number of submission attempts by result")
        .build()
}

/// Counter: failed attempts that were scheduled for another try.
pub fn submission_retries() -> Counter<u64> {
    meter()
        .u64_counter("foia.submission.retries")
        .with_description("Number of failed submissions re-queued")
        .build()
}

/// Counter: requests that exhausted their attempts and went to failed.
pub fn submission_given_up() -> Counter<u64> {
    meter()
        .u64_counter("foia.submission.given_up")
        .with_description("Number of requests that failed too many times")
        .build()
}

/// Counter: webform submissions deleted after a confirmed delivery.
pub fn webform_submissions_deleted() -> Counter<u64> {
    meter()
        .u64_counter("foia.webform_submission.deleted")
        .with_description("Number of webform submissions cleaned up")
        .build()
}

/// Counter: queue-level operations (send, read, archive, set_vt).
/// Labels: `queue`, `operation`.
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("foia.queue.operations")
        .with_description("Number of queue operations")
        .build()
}

/// Histogram: end-to-end dispatch duration in milliseconds.
/// Labels: `disposition`.
pub fn dispatch_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("foia.dispatch.duration_ms")
        .with_description("Dispatch duration in milliseconds")
        .with_unit("ms")
        .build()
}
