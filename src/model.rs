//! Core data model.
//!
//! A FOIA request is one citizen's submission waiting to be delivered to an
//! agency component. It carries the routing target, the workflow status, and
//! the bookkeeping fields the dispatch worker writes after every attempt.

pub mod outcome;

pub use outcome::{FailureDetail, Receipt, SubmissionOutcome};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Submission method tag for asynchronous delivery by email.
pub const METHOD_EMAIL: &str = "email";

/// Submission method tag for direct delivery to a case management API.
pub const METHOD_API: &str = "api";

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Newtype for FOIA request IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub i64);

/// Newtype for the original webform submission behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub i64);

/// Newtype for the agency component a request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgencyComponentId(pub i64);

macro_rules! display_inner {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

display_inner!(RequestId, SubmissionId, AgencyComponentId);

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Workflow status of a FOIA request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Waiting for (another) delivery attempt.
    Queued,
    /// Accepted by the agency component.
    Submitted,
    /// Handed to an asynchronous channel; delivery not yet confirmed.
    InTransit,
    /// Gave up after too many failed attempts. Needs an operator.
    Failed,
}

impl RequestStatus {
    /// Can transition from self to `to`?
    pub fn can_transition_to(self, to: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, to),
            (Queued, Submitted)
                | (Queued, InTransit)
                | (Queued, Failed)
                | (Queued, Queued) // retry
        )
    }

    /// Is this a terminal status for the dispatch workflow?
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Queued)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Queued => "queued",
            RequestStatus::Submitted => "submitted",
            RequestStatus::InTransit => "in_transit",
            RequestStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "queued" => Ok(RequestStatus::Queued),
            "submitted" => Ok(RequestStatus::Submitted),
            "in_transit" => Ok(RequestStatus::InTransit),
            "failed" => Ok(RequestStatus::Failed),
            other => Err(Error::Other(format!("unknown request status: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// FOIA Request
// ---------------------------------------------------------------------------

/// A FOIA request as seen by the dispatch workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoiaRequest {
    pub id: RequestId,

    /// Agency component the request is addressed to. Selects the channel.
    pub agency_component: AgencyComponentId,

    status: RequestStatus,

    /// How the last attempt was delivered ("email", "api", ...). Empty if unknown.
    pub submission_method: String,

    /// When the last attempt was dispatched.
    pub submission_time: Option<DateTime<Utc>>,

    pub response_code: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub error_description: Option<String>,

    /// Identifier assigned by the agency's case management system.
    pub case_management_id: Option<String>,
    pub tracking_number: Option<String>,

    failure_count: u32,

    /// The webform submission this request was created from.
    pub webform_submission_id: Option<SubmissionId>,
}

impl FoiaRequest {
    /// A freshly queued request with no attempts recorded.
    pub fn new(id: RequestId, agency_component: AgencyComponentId) -> Self {
        Self {
            id,
            agency_component,
            status: RequestStatus::Queued,
            submission_method: String::new(),
            submission_time: None,
            response_code: None,
            error_code: None,
            error_message: None,
            error_description: None,
            case_management_id: None,
            tracking_number: None,
            failure_count: 0,
            webform_submission_id: None,
        }
    }

    pub fn with_webform_submission(mut self, id: SubmissionId) -> Self {
        self.webform_submission_id = Some(id);
        self
    }

    /// Rebuild a request from persisted workflow fields.
    pub fn restore(mut self, status: RequestStatus, failure_count: u32) -> Self {
        self.status = status;
        self.failure_count = failure_count;
        self
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Move to a new status, enforcing the workflow state machine.
    pub fn transition(&mut self, to: RequestStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Count one more failed attempt. Returns the new total.
    pub fn record_failure(&mut self) -> u32 {
        self.failure_count = self.failure_count.saturating_add(1);
        self.failure_count
    }
}

/// Assign `value` to `field` only if it carries something. Absent or empty
/// values never clear what an earlier attempt recorded.
pub(crate) fn set_if_present(field: &mut Option<String>, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        *field = Some(v.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_queued_requests_can_move() {
        use RequestStatus::*;
        for to in [Queued, Submitted, InTransit, Failed] {
            assert!(Queued.can_transition_to(to));
        }
        for from in [Submitted, InTransit, Failed] {
            assert!(from.is_terminal());
            for to in [Queued, Submitted, InTransit, Failed] {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn transition_out_of_terminal_is_rejected() {
        let mut request = FoiaRequest::new(RequestId(1), AgencyComponentId(2));
        request.transition(RequestStatus::Failed).unwrap();
        let err = request.transition(RequestStatus::Queued).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(request.status(), RequestStatus::Failed);
    }

    #[test]
    fn status_parses_its_own_names() {
        for status in [
            RequestStatus::Queued,
            RequestStatus::Submitted,
            RequestStatus::InTransit,
            RequestStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<RequestStatus>().unwrap(), status);
        }
        assert!("archived".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn empty_values_do_not_clear_fields() {
        let mut field = Some("E-1".to_string());
        set_if_present(&mut field, None);
        set_if_present(&mut field, Some(""));
        assert_eq!(field.as_deref(), Some("E-1"));
        set_if_present(&mut field, Some("E-2"));
        assert_eq!(field.as_deref(), Some("E-2"));
    }
}
