//! Integration tests for telemetry initialization and span helpers.

use foia_dispatch::model::{AgencyComponentId, RequestId, RequestStatus};

#[test]
fn telemetry_initializes_without_endpoint() {
    // A global subscriber can only be set once per process, so this may
    // return Err if another test got there first; that is acceptable.
    let config = foia_dispatch::telemetry::TelemetryConfig {
        endpoint: None,
        service_name: "foia-dispatch-test".to_string(),
        log_level: "debug".to_string(),
    };
    let _guard = foia_dispatch::telemetry::init_telemetry(config);
}

#[test]
fn submission_span_records_method_and_transition() {
    let span = foia_dispatch::telemetry::submission::start_submission_span(
        RequestId(1),
        AgencyComponentId(10),
    );
    foia_dispatch::telemetry::submission::record_method(&span, "api");
    foia_dispatch::telemetry::submission::record_status_transition(
        &span,
        RequestStatus::Queued,
        RequestStatus::Submitted,
    );
}
