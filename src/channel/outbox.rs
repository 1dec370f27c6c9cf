//! Drop-directory channel: writes each request as JSON for a downstream mailer.
//!
//! Delivery is asynchronous, so successful writes report the email method and
//! the request goes in transit rather than submitted.

use super::SubmissionChannel;
use crate::model::{FailureDetail, FoiaRequest, METHOD_EMAIL, Receipt, SubmissionOutcome};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

pub struct OutboxChannel {
    dir: PathBuf,
    last_error: Mutex<Option<FailureDetail>>,
}

impl OutboxChannel {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            last_error: Mutex::new(None),
        }
    }

    /// Path of the file a request is written to.
    pub fn path_for(&self, request: &FoiaRequest) -> PathBuf {
        self.dir.join(format!("foia-request-{}.json", request.id))
    }

    async fn write(&self, path: &Path, request: &FoiaRequest) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_vec_pretty(request)?;
        // Write then rename so the mailer never picks up a partial file.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, path).await
    }

    fn remember(&self, detail: FailureDetail) {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = Some(detail);
        }
    }
}

#[async_trait]
impl SubmissionChannel for OutboxChannel {
    async fn submit(&self, request: &FoiaRequest) -> SubmissionOutcome {
        let path = self.path_for(request);
        match self.write(&path, request).await {
            Ok(()) => {
                debug!(id = %request.id, path = %path.display(), "request written to outbox");
                SubmissionOutcome::Delivered(Receipt::via(METHOD_EMAIL))
            }
            Err(e) => {
                warn!(id = %request.id, path = %path.display(), error = %e, "outbox write failed");
                self.remember(
                    FailureDetail::new("outbox_write", e.to_string())
                        .description(format!("could not write {}", path.display())),
                );
                SubmissionOutcome::NoResult
            }
        }
    }

    fn last_errors(&self) -> FailureDetail {
        self.last_error
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
            .unwrap_or_else(|| FailureDetail::new("unknown", "outbox reported no error detail"))
    }
}
