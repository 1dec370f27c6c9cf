//! Control plane: polls the submission queue and feeds items to the worker.
//!
//! This is the queue-runtime boundary. The worker's result maps onto pgmq:
//! done items are archived, retries are hidden for `retry_delay`, and items
//! whose processing keeps erroring are dead-lettered after `max_deliveries`
//! reads.

use crate::channel::ChannelFactory;
use crate::db::Db;
use crate::db::pgmq::PgmqMessage;
use crate::error::Result;
use crate::engine::handler::Disposition;
use crate::engine::worker::{QueueItem, SubmissionWorker};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// Default queue the request intake pushes onto.
pub const SUBMISSION_QUEUE: &str = "foia_submissions";

/// Configuration for the control plane.
#[derive(Debug, Clone)]
pub struct ControlConfig {
    pub queue_name: String,
    /// Visibility timeout (seconds) for pgmq reads.
    pub visibility_timeout: i32,
    /// Delay (seconds) before a retried item becomes visible again.
    pub retry_delay: i32,
    /// Reads after which an erroring item is archived instead of redelivered.
    pub max_deliveries: i32,
    /// Sleep between polls when the queue is empty.
    pub poll_interval: std::time::Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            queue_name: SUBMISSION_QUEUE.to_string(),
            visibility_timeout: 60,
            retry_delay: 300,
            max_deliveries: 10,
            poll_interval: std::time::Duration::from_secs(5),
        }
    }
}

/// What the control plane did with one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAction {
    Archived,
    RetryScheduled,
    LeftForRedelivery,
    DeadLettered,
}

/// The consumer loop: read one message, dispatch it, settle it.
pub struct ControlPlane<F: ?Sized> {
    db: Arc<Db>,
    worker: Arc<SubmissionWorker<Db, F>>,
    config: ControlConfig,
    shutdown: Arc<Notify>,
}

impl<F: ?Sized> Clone for ControlPlane<F> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            worker: Arc::clone(&self.worker),
            config: self.config.clone(),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<F> ControlPlane<F>
where
    F: ChannelFactory + ?Sized,
{
    pub fn new(db: Arc<Db>, worker: Arc<SubmissionWorker<Db, F>>, config: ControlConfig) -> Self {
        Self {
            db,
            worker,
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Signal the control plane to shut down.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Run the control plane loop until shutdown.
    pub async fn run(&self) -> Result<()> {
        self.db.create_queue(&self.config.queue_name).await?;
        info!(queue = %self.config.queue_name, "control plane started, polling for submissions");

        loop {
            // An item in flight is always settled before shutdown is observed.
            let idle = match self.poll_once().await {
                Ok(Some(_)) => false,
                Ok(None) => true,
                Err(e) => {
                    error!("queue poll error: {e}");
                    true
                }
            };
            let pause = if idle {
                self.config.poll_interval
            } else {
                std::time::Duration::ZERO
            };

            tokio::select! {
                biased;
                _ = self.shutdown.notified() => {
                    info!("control plane shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }

    /// Read and settle at most one message. Returns None if the queue was empty.
    pub async fn poll_once(&self) -> Result<Option<MessageAction>> {
        let msg = self
            .db
            .read_from_queue(&self.config.queue_name, self.config.visibility_timeout)
            .await?;

        match msg {
            Some(msg) => self.settle(msg).await.map(Some),
            None => Ok(None),
        }
    }

    async fn settle(&self, msg: PgmqMessage) -> Result<MessageAction> {
        let queue = self.config.queue_name.as_str();

        let item: QueueItem = match serde_json::from_value(msg.message.clone()) {
            Ok(item) => item,
            Err(e) => {
                error!(msg_id = msg.msg_id, payload = %msg.message, "malformed queue item, archiving: {e}");
                self.db.archive_message(queue, msg.msg_id).await?;
                return Ok(MessageAction::DeadLettered);
            }
        };

        match self.worker.process(item).await {
            Ok(Disposition::Done) => {
                self.db.archive_message(queue, msg.msg_id).await?;
                Ok(MessageAction::Archived)
            }
            Ok(Disposition::Retry(_)) => {
                info!(id = %item.id, retry_in = self.config.retry_delay, "retry scheduled");
                self.db
                    .set_visibility_timeout(queue, msg.msg_id, self.config.retry_delay)
                    .await?;
                Ok(MessageAction::RetryScheduled)
            }
            Err(e) if msg.read_ct >= self.config.max_deliveries => {
                error!(
                    id = %item.id,
                    reads = msg.read_ct,
                    "submission kept erroring, dead-lettering: {e}"
                );
                self.db.archive_message(queue, msg.msg_id).await?;
                Ok(MessageAction::DeadLettered)
            }
            Err(e) => {
                // Visibility timeout will make it reappear.
                warn!(id = %item.id, reads = msg.read_ct, "submission errored, will redeliver: {e}");
                Ok(MessageAction::LeftForRedelivery)
            }
        }
    }
}
