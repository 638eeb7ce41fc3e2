//! Wire models for the activity-history endpoints.

use jobtrail_commons::{JobKind, JobRecord};
use jobtrail_core::activity::results::{BulkItem, ItemOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Query parameters of `GET /v1/activity/jobs`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityListParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub mode: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Success envelope of the list endpoint.
#[derive(Debug, Serialize)]
pub struct ActivityListResponse {
    pub success: bool,
    pub data: Vec<JobRecord>,
}

impl ActivityListResponse {
    pub fn new(data: Vec<JobRecord>) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Error envelope shared by both endpoints.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Body of `POST /v1/activity/jobs/results`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkResultsRequest {
    pub job_ids: Vec<String>,
}

/// Per-id outcome row of the bulk endpoint. Every field is always present;
/// inapplicable ones are null.
#[derive(Debug, Serialize)]
pub struct ResultRow {
    pub job_id: Uuid,
    pub mode: Option<JobKind>,
    pub result_json: Option<JsonValue>,
    pub found: bool,
    pub error: Option<String>,
}

impl From<BulkItem> for ResultRow {
    fn from(item: BulkItem) -> Self {
        match item.outcome {
            ItemOutcome::UnauthorizedOrNotFound => ResultRow {
                job_id: item.job_id,
                mode: None,
                result_json: None,
                found: false,
                error: Some("unauthorized_or_not_found".to_string()),
            },
            ItemOutcome::ResultNotFound { kind } => ResultRow {
                job_id: item.job_id,
                mode: Some(kind),
                result_json: None,
                found: false,
                error: Some("result_not_found".to_string()),
            },
            ItemOutcome::Found { kind, payload } => ResultRow {
                job_id: item.job_id,
                mode: Some(kind),
                result_json: Some(payload),
                found: true,
                error: None,
            },
        }
    }
}

/// Success envelope of the bulk endpoint.
#[derive(Debug, Serialize)]
pub struct BulkResultsResponse {
    pub success: bool,
    pub data: Vec<ResultRow>,
}

impl BulkResultsResponse {
    pub fn new(data: Vec<ResultRow>) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
