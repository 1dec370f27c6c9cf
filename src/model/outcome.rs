//! Submission outcome types returned by channels.

use serde::{Deserialize, Serialize};

use crate::config::FORCE_FAILURES_VAR;

/// What a channel reports for one delivery attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// The agency component accepted the request.
    Delivered(Receipt),
    /// The attempt failed and the channel described why.
    Failed(FailureDetail),
    /// The channel produced nothing usable. Ask it for `last_errors()`.
    NoResult,
}

/// Success descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Method tag, e.g. "email" or "api".
    pub method: Option<String>,
    pub case_management_id: Option<String>,
    pub tracking_number: Option<String>,
    pub response_code: Option<String>,
}

impl Receipt {
    pub fn via(method: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            ..Self::default()
        }
    }

    pub fn case_management_id(mut self, id: impl Into<String>) -> Self {
        self.case_management_id = Some(id.into());
        self
    }

    pub fn tracking_number(mut self, number: impl Into<String>) -> Self {
        self.tracking_number = Some(number.into());
        self
    }

    pub fn response_code(mut self, code: impl Into<String>) -> Self {
        self.response_code = Some(code.into());
        self
    }
}

/// Failure descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Method tag of the channel that failed, if it reports one.
    pub method: Option<String>,
    pub response_code: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
    pub description: Option<String>,
}

impl FailureDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn response_code(mut self, code: impl Into<String>) -> Self {
        self.response_code = Some(code.into());
        self
    }

    /// Mock detail substituted for every attempt while forced failures are on.
    pub fn forced() -> Self {
        Self::new("503", "Forced failure")
            .response_code("503")
            .description(format!(
                "Forcing a failure, according to the \"{FORCE_FAILURES_VAR}\" setting."
            ))
    }
}
