//! Submission worker: dispatches one queued FOIA request per call.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use opentelemetry::KeyValue;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, info, warn};

use super::handler::{Disposition, OutcomeHandler};
use super::policy::FailurePolicy;
use crate::channel::ChannelFactory;
use crate::config::WorkerConfig;
use crate::error::{Error, Result};
use crate::model::{FailureDetail, FoiaRequest, RequestId, RequestStatus, SubmissionOutcome};
use crate::store::RequestStore;
use crate::telemetry::metrics;
use crate::telemetry::submission::start_submission_span;

/// Payload of one queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: RequestId,
}

pub struct SubmissionWorker<S: ?Sized, F: ?Sized> {
    store: Arc<S>,
    channels: Arc<F>,
    handler: OutcomeHandler<S>,
    force_failures: bool,
}

impl<S, F> SubmissionWorker<S, F>
where
    S: RequestStore + ?Sized,
    F: ChannelFactory + ?Sized,
{
    pub fn new(store: Arc<S>, channels: Arc<F>, config: WorkerConfig) -> Self {
        if config.force_failures {
            warn!("forced failures enabled: every submission will be treated as failed");
        }
        Self {
            handler: OutcomeHandler::new(
                Arc::clone(&store),
                FailurePolicy::new(config.max_submission_failures),
            ),
            store,
            channels,
            force_failures: config.force_failures,
        }
    }

    /// Dispatch the request named by a queue item.
    ///
    /// `Ok(Disposition::Retry)` asks the queue runtime to redeliver later.
    /// Errors (unknown request, no channel, storage failure) are returned
    /// unhandled; the runtime decides what to do with them.
    pub async fn process(&self, item: QueueItem) -> Result<Disposition> {
        let start = Instant::now();
        let mut request = self.store.load_request(item.id).await?;

        if request.status().is_terminal() {
            warn!(
                id = %request.id,
                status = %request.status(),
                "request already dispatched, skipping redelivery"
            );
            self.finish_cleanup(&request).await?;
            return Ok(Disposition::Done);
        }

        let span = start_submission_span(request.id, request.agency_component);
        let channel = self.channels.resolve(request.agency_component)?;

        let disposition = async {
            request.submission_time = Some(Utc::now());

            let mut outcome = channel.submit(&request).await;
            if self.force_failures {
                outcome = SubmissionOutcome::Failed(FailureDetail::forced());
            }

            let disposition = self
                .handler
                .handle(&mut request, outcome, channel.as_ref())
                .await?;
            info!(
                id = %request.id,
                status = %request.status(),
                failures = request.failure_count(),
                "submission handled"
            );
            Ok::<_, Error>(disposition)
        }
        .instrument(span)
        .await?;

        metrics::dispatch_duration_ms().record(
            start.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new(
                "disposition",
                if disposition.is_retry() { "retry" } else { "done" },
            )],
        );

        Ok(disposition)
    }

    /// Redo the webform submission delete for a request that was saved as
    /// submitted but whose cleanup never completed. A submission that is
    /// already gone counts as cleaned up.
    async fn finish_cleanup(&self, request: &FoiaRequest) -> Result<()> {
        if request.status() != RequestStatus::Submitted {
            return Ok(());
        }
        let Some(submission) = request.webform_submission_id else {
            return Ok(());
        };

        match self.store.delete_submission(submission).await {
            Ok(()) => {
                metrics::webform_submissions_deleted().add(1, &[]);
                info!(id = %request.id, %submission, "finished pending webform submission cleanup");
                Ok(())
            }
            Err(Error::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
