//! Persistence boundary for the dispatch workflow.
//!
//! The worker only needs three operations: load a request, save it back, and
//! delete the webform submission it came from. Postgres (`db::Db`) is the
//! production backend; `MemoryStore` backs tests and dry runs.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::model::{FoiaRequest, RequestId, SubmissionId};

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Load a request by ID. Missing requests are `Error::NotFound`.
    async fn load_request(&self, id: RequestId) -> Result<FoiaRequest>;

    /// Persist every workflow field of the request.
    async fn save_request(&self, request: &FoiaRequest) -> Result<()>;

    /// Delete a webform submission. Missing submissions are `Error::NotFound`.
    async fn delete_submission(&self, id: SubmissionId) -> Result<()>;
}

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    requests: Mutex<HashMap<RequestId, FoiaRequest>>,
    submissions: Mutex<HashSet<SubmissionId>>,
    saves: Mutex<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a request. Also registers its webform submission.
    pub async fn insert(&self, request: FoiaRequest) {
        if let Some(submission) = request.webform_submission_id {
            self.submissions.lock().await.insert(submission);
        }
        self.requests.lock().await.insert(request.id, request);
    }

    /// Snapshot of a stored request.
    pub async fn get(&self, id: RequestId) -> Option<FoiaRequest> {
        self.requests.lock().await.get(&id).cloned()
    }

    pub async fn has_submission(&self, id: SubmissionId) -> bool {
        self.submissions.lock().await.contains(&id)
    }

    /// Number of `save_request` calls so far.
    pub async fn save_count(&self) -> u64 {
        *self.saves.lock().await
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn load_request(&self, id: RequestId) -> Result<FoiaRequest> {
        self.get(id)
            .await
            .ok_or_else(|| Error::NotFound(format!("foia request {id}")))
    }

    async fn save_request(&self, request: &FoiaRequest) -> Result<()> {
        self.requests
            .lock()
            .await
            .insert(request.id, request.clone());
        *self.saves.lock().await += 1;
        Ok(())
    }

    async fn delete_submission(&self, id: SubmissionId) -> Result<()> {
        if self.submissions.lock().await.remove(&id) {
            Ok(())
        } else {
            Err(Error::NotFound(format!("webform submission {id}")))
        }
    }
}
