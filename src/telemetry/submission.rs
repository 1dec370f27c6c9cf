//! Dispatch span helpers.

use tracing::Span;

use crate::model::{AgencyComponentId, RequestId, RequestStatus};

/// Start a span covering one dispatch attempt.
///
/// `foia.method` and `foia.status` are declared empty and filled in once
/// the outcome is known.
pub fn start_submission_span(id: RequestId, agency: AgencyComponentId) -> Span {
    tracing::info_span!(
        "foia.submit",
        "foia.request.id" = id.0,
        "foia.agency_component" = agency.0,
        "foia.method" = tracing::field::Empty,
        "foia.status" = tracing::field::Empty,
    )
}

/// Record a status transition on the span and as an `info` event.
pub fn record_status_transition(span: &Span, from: RequestStatus, to: RequestStatus) {
    span.record("foia.status", to.as_str());
    span.in_scope(|| {
        tracing::info!(from = from.as_str(), to = to.as_str(), "status_transition");
    });
}

/// Record the submission method reported by the channel.
pub fn record_method(span: &Span, method: &str) {
    span.record("foia.method", method);
}
