//! Channel registry routing and the outbox channel.

use std::sync::Arc;

use async_trait::async_trait;
use foia_dispatch::channel::outbox::OutboxChannel;
use foia_dispatch::channel::{ChannelFactory, ChannelRegistry, SubmissionChannel};
use foia_dispatch::error::Error;
use foia_dispatch::model::*;

/// Channel that always delivers through a fixed method.
struct FixedChannel(&'static str);

#[async_trait]
impl SubmissionChannel for FixedChannel {
    async fn submit(&self, _request: &FoiaRequest) -> SubmissionOutcome {
        SubmissionOutcome::Delivered(Receipt::via(self.0))
    }

    fn last_errors(&self) -> FailureDetail {
        FailureDetail::new("none", "fixed channel never fails")
    }
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("foia-dispatch-{name}-{}", uuid::Uuid::new_v4()))
}

fn registry() -> ChannelRegistry {
    ChannelRegistry::empty()
        .register("api", Arc::new(FixedChannel(METHOD_API)))
        .register("email", Arc::new(FixedChannel(METHOD_EMAIL)))
}

async fn method_for(registry: &ChannelRegistry, agency: i64) -> Option<String> {
    let channel = registry.resolve(AgencyComponentId(agency)).unwrap();
    let request = FoiaRequest::new(RequestId(1), AgencyComponentId(agency));
    match channel.submit(&request).await {
        SubmissionOutcome::Delivered(receipt) => receipt.method,
        other => panic!("expected delivery, got {other:?}"),
    }
}

#[tokio::test]
async fn explicit_route_wins_over_default() {
    let registry = registry()
        .route(AgencyComponentId(7), "api")
        .default_channel("email");

    assert_eq!(method_for(&registry, 7).await.as_deref(), Some(METHOD_API));
    assert_eq!(method_for(&registry, 8).await.as_deref(), Some(METHOD_EMAIL));
}

#[test]
fn unrouted_agency_without_default_is_unresolved() {
    let registry = registry().route(AgencyComponentId(7), "api");
    let err = registry.resolve(AgencyComponentId(8)).err().unwrap();
    assert!(matches!(err, Error::ChannelUnresolved(_)), "got {err:?}");
}

#[test]
fn route_to_unregistered_channel_is_unresolved() {
    let registry = registry().route(AgencyComponentId(7), "fax");
    let err = registry.resolve(AgencyComponentId(7)).err().unwrap();
    assert!(matches!(err, Error::ChannelUnresolved(_)), "got {err:?}");
}

#[tokio::test]
async fn load_routes_from_toml() {
    let path = temp_path("routes");
    std::fs::write(
        &path,
        r#"
default_channel = "email"

[[route]]
agency_component = 42
channel = "api"
"#,
    )
    .unwrap();

    let registry = registry().load_routes(&path).unwrap();
    assert_eq!(method_for(&registry, 42).await.as_deref(), Some(METHOD_API));
    assert_eq!(method_for(&registry, 43).await.as_deref(), Some(METHOD_EMAIL));

    std::fs::remove_file(&path).ok();
}

#[test]
fn load_routes_rejects_unknown_channel() {
    let path = temp_path("bad-routes");
    std::fs::write(
        &path,
        r#"
[[route]]
agency_component = 1
channel = "carrier-pigeon"
"#,
    )
    .unwrap();

    let err = registry().load_routes(&path).err().unwrap();
    assert!(matches!(err, Error::Config(_)), "got {err:?}");

    std::fs::remove_file(&path).ok();
}

#[test]
fn load_routes_missing_file_is_config_error() {
    let err = registry().load_routes(&temp_path("missing")).err().unwrap();
    assert!(matches!(err, Error::Config(_)), "got {err:?}");
}

#[tokio::test]
async fn outbox_writes_request_and_reports_email() {
    let dir = temp_path("outbox");
    let outbox = OutboxChannel::new(&dir);
    let request = FoiaRequest::new(RequestId(5), AgencyComponentId(1))
        .with_webform_submission(SubmissionId(500));

    let outcome = outbox.submit(&request).await;
    let SubmissionOutcome::Delivered(receipt) = outcome else {
        panic!("expected delivery, got {outcome:?}");
    };
    assert_eq!(receipt.method.as_deref(), Some(METHOD_EMAIL));

    let written = std::fs::read_to_string(outbox.path_for(&request)).unwrap();
    let roundtrip: FoiaRequest = serde_json::from_str(&written).unwrap();
    assert_eq!(roundtrip, request);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn outbox_write_failure_yields_no_result_with_detail() {
    // A plain file where the directory should be makes every write fail.
    let blocker = temp_path("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let outbox = OutboxChannel::new(&blocker);
    let request = FoiaRequest::new(RequestId(6), AgencyComponentId(1));

    let outcome = outbox.submit(&request).await;
    assert!(matches!(outcome, SubmissionOutcome::NoResult), "got {outcome:?}");

    let detail = outbox.last_errors();
    assert_eq!(detail.code.as_deref(), Some("outbox_write"));
    assert!(detail.message.is_some());

    std::fs::remove_file(&blocker).ok();
}
