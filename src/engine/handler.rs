//! Applies a channel's outcome to a request and persists the result.

use std::sync::Arc;

use opentelemetry::KeyValue;
use tracing::{Span, debug, error, warn};

use super::policy::{Decision, FailurePolicy};
use crate::channel::SubmissionChannel;
use crate::error::Result;
use crate::model::{
    FailureDetail, FoiaRequest, METHOD_EMAIL, Receipt, RequestStatus, SubmissionId,
    SubmissionOutcome, set_if_present,
};
use crate::store::RequestStore;
use crate::telemetry::metrics;
use crate::telemetry::submission::{record_method, record_status_transition};

/// What the queue runtime should do with the item after handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Finished with this item; acknowledge it.
    Done,
    /// Redeliver the item later. Carries the log message.
    Retry(String),
}

impl Disposition {
    pub fn is_retry(&self) -> bool {
        matches!(self, Disposition::Retry(_))
    }
}

/// Turns a submission outcome into request state.
pub struct OutcomeHandler<S: ?Sized> {
    store: Arc<S>,
    policy: FailurePolicy,
}

impl<S: RequestStore + ?Sized> OutcomeHandler<S> {
    pub fn new(store: Arc<S>, policy: FailurePolicy) -> Self {
        Self { store, policy }
    }

    /// Apply `outcome` to `request`, save it, and clean up the webform
    /// submission once delivery no longer needs it.
    ///
    /// The request is always saved. The webform submission is deleted only
    /// after the save succeeds, and only for deliveries that are not in transit.
    pub async fn handle(
        &self,
        request: &mut FoiaRequest,
        outcome: SubmissionOutcome,
        channel: &dyn SubmissionChannel,
    ) -> Result<Disposition> {
        let from = request.status();

        let effective = match outcome {
            SubmissionOutcome::Delivered(receipt) => Ok(receipt),
            SubmissionOutcome::Failed(detail) => Err(detail),
            SubmissionOutcome::NoResult => Err(channel.last_errors()),
        };

        let (method, response_code, disposition, cleanup) = match effective {
            Ok(receipt) => {
                let cleanup = self.apply_delivery(request, &receipt)?;
                (receipt.method, receipt.response_code, Disposition::Done, cleanup)
            }
            Err(detail) => {
                let disposition = self.apply_failure(request, &detail)?;
                (detail.method, detail.response_code, disposition, None)
            }
        };

        request.submission_method = method.unwrap_or_default();
        set_if_present(&mut request.response_code, response_code.as_deref());

        let span = Span::current();
        record_method(&span, &request.submission_method);
        record_status_transition(&span, from, request.status());
        metrics::submission_attempts()
            .add(1, &[KeyValue::new("result", request.status().as_str())]);

        self.store.save_request(request).await?;

        if let Some(submission) = cleanup {
            self.store.delete_submission(submission).await?;
            metrics::webform_submissions_deleted().add(1, &[]);
            debug!(id = %request.id, %submission, "webform submission deleted");
        }

        Ok(disposition)
    }

    /// Success path. Returns the webform submission to delete, if any.
    fn apply_delivery(
        &self,
        request: &mut FoiaRequest,
        receipt: &Receipt,
    ) -> Result<Option<SubmissionId>> {
        let status = if receipt.method.as_deref() == Some(METHOD_EMAIL) {
            RequestStatus::InTransit
        } else {
            RequestStatus::Submitted
        };
        request.transition(status)?;

        set_if_present(
            &mut request.case_management_id,
            receipt.case_management_id.as_deref(),
        );
        set_if_present(
            &mut request.tracking_number,
            receipt.tracking_number.as_deref(),
        );

        // Email delivery is not confirmed yet; the submission is still needed.
        if status == RequestStatus::InTransit {
            return Ok(None);
        }
        if request.webform_submission_id.is_none() {
            warn!(id = %request.id, "submitted request has no webform submission to clean up");
        }
        Ok(request.webform_submission_id)
    }

    /// Failure path. Records the error detail and applies the retry policy.
    fn apply_failure(
        &self,
        request: &mut FoiaRequest,
        detail: &FailureDetail,
    ) -> Result<Disposition> {
        set_if_present(&mut request.error_code, detail.code.as_deref());
        set_if_present(&mut request.error_message, detail.message.as_deref());
        set_if_present(&mut request.error_description, detail.description.as_deref());

        let failures = request.record_failure();

        match self.policy.decide(failures) {
            Decision::Retry => {
                request.transition(RequestStatus::Queued)?;
                let message = format!(
                    "Failed submission {}. Scheduling re-queue #{failures}.",
                    request.id
                );
                error!("{message}");
                metrics::submission_retries().add(1, &[]);
                Ok(Disposition::Retry(message))
            }
            Decision::GiveUp => {
                request.transition(RequestStatus::Failed)?;
                error!(
                    "FOIA request failed too many times. Attention needed. Id: {}.",
                    request.id
                );
                metrics::submission_given_up().add(1, &[]);
                Ok(Disposition::Done)
            }
        }
    }
}
