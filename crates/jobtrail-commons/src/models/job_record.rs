//! The unified activity-log row.

use super::JobKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Model name reported for agent jobs that did not record one explicitly.
pub const DEFAULT_AGENT_MODEL: &str = "spider-1";

/// One row of the unified activity log.
///
/// Exactly one `JobRecord` exists per underlying request id. Fields that do
/// not apply to a record's kind are always serialized as `null`, never
/// omitted, so the row shape is stable across all eight kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: Uuid,
    pub kind: JobKind,
    pub created_at: DateTime<Utc>,
    pub origin: Option<String>,
    /// The crawled URL, mapped site, or search query that started the job.
    pub url_or_query: Option<String>,
    /// `None` means the outcome is unknown (job still running, or the kind
    /// row never reported one).
    pub success: Option<bool>,
    pub credits_billed: Option<f64>,
    /// Document count; only multi-document kinds and map/deep-research
    /// report it.
    pub num_docs: Option<i64>,
    /// Wall-clock duration in seconds.
    pub time_taken: Option<f64>,
    /// Failure message; only meaningful for kinds that report failures.
    pub message: Option<String>,
    /// Count of non-benign child fetch failures; multi-document kinds only.
    pub error_count: Option<i64>,
    /// Agent kind only; defaults to [`DEFAULT_AGENT_MODEL`] when unset.
    pub agent_model: Option<String>,
    /// Single-page fetch kind only.
    pub scrape_options: Option<JsonValue>,
    pub scrape_pdf_num_pages: Option<i64>,
    pub api_key_id: i64,
}
