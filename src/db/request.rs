//! FOIA request persistence and webform submission cleanup.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model::{AgencyComponentId, FoiaRequest, RequestId, SubmissionId};
use crate::store::RequestStore;

impl super::Db {
    /// Get a FOIA request by ID.
    pub async fn get_request(&self, id: RequestId) -> Result<FoiaRequest> {
        let row: Option<FoiaRequestRow> = sqlx::query_as(
            "SELECT id, agency_component, status, submission_method, submission_time, response_code,
                    error_code, error_message, error_description, case_management_id, tracking_number,
                    failure_count, webform_submission_id
             FROM foia_requests WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(self.pool())
        .await?;

        row.ok_or_else(|| Error::NotFound(format!("foia request {id}")))?
            .try_into_request()
    }

    /// Write back every workflow field of a request.
    pub async fn update_request(&self, request: &FoiaRequest) -> Result<()> {
        let failure_count = i32::try_from(request.failure_count()).map_err(|_| {
            Error::Other(format!(
                "failure_count {} on request {} does not fit the column",
                request.failure_count(),
                request.id
            ))
        })?;

        let rows_affected = sqlx::query(
            "UPDATE foia_requests SET
                status = $1, submission_method = $2, submission_time = $3, response_code = $4,
                error_code = $5, error_message = $6, error_description = $7,
                case_management_id = $8, tracking_number = $9, failure_count = $10,
                updated_at = now()
             WHERE id = $11",
        )
        .bind(request.status().as_str())
        .bind(&request.submission_method)
        .bind(request.submission_time)
        .bind(&request.response_code)
        .bind(&request.error_code)
        .bind(&request.error_message)
        .bind(&request.error_description)
        .bind(&request.case_management_id)
        .bind(&request.tracking_number)
        .bind(failure_count)
        .bind(request.id.0)
        .execute(self.pool())
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("foia request {}", request.id)));
        }
        Ok(())
    }

    /// Delete a webform submission by ID.
    pub async fn delete_webform_submission(&self, id: SubmissionId) -> Result<()> {
        let rows_affected = sqlx::query("DELETE FROM webform_submissions WHERE id = $1")
            .bind(id.0)
            .execute(self.pool())
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(Error::NotFound(format!("webform submission {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RequestStore for super::Db {
    async fn load_request(&self, id: RequestId) -> Result<FoiaRequest> {
        self.get_request(id).await
    }

    async fn save_request(&self, request: &FoiaRequest) -> Result<()> {
        self.update_request(request).await
    }

    async fn delete_submission(&self, id: SubmissionId) -> Result<()> {
        self.delete_webform_submission(id).await
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct FoiaRequestRow {
    id: i64,
    agency_component: i64,
    status: String,
    submission_method: String,
    submission_time: Option<chrono::DateTime<chrono::Utc>>,
    response_code: Option<String>,
    error_code: Option<String>,
    error_message: Option<String>,
    error_description: Option<String>,
    case_management_id: Option<String>,
    tracking_number: Option<String>,
    failure_count: i32,
    webform_submission_id: Option<i64>,
}

impl FoiaRequestRow {
    fn try_into_request(self) -> Result<FoiaRequest> {
        let status = self.status.parse()?;
        let failure_count = u32::try_from(self.failure_count)
            .map_err(|_| Error::Other(format!("negative failure_count on request {}", self.id)))?;

        let mut request = FoiaRequest::new(RequestId(self.id), AgencyComponentId(self.agency_component))
            .restore(status, failure_count);
        request.submission_method = self.submission_method;
        request.submission_time = self.submission_time;
        request.response_code = self.response_code;
        request.error_code = self.error_code;
        request.error_message = self.error_message;
        request.error_description = self.error_description;
        request.case_management_id = self.case_management_id;
        request.tracking_number = self.tracking_number;
        request.webform_submission_id = self.webform_submission_id.map(SubmissionId);
        Ok(request)
    }
}
