//! Handlers for the activity-history endpoints.
//!
//! Validation order is fixed: feature flag, store reachability, credential
//! scope, then per-parameter checks. Any validation failure fails the whole
//! call; there is no partial success at this layer. The bulk endpoint's
//! per-item failures live inside its 200 response instead.

use crate::middleware::Identity;
use crate::models::{
    ActivityListParams, ActivityListResponse, ApiError, BulkResultsRequest, BulkResultsResponse,
    ResultRow,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use jobtrail_commons::{ActivityError, JobKind};
use jobtrail_core::activity::ownership::MAX_BATCH_IDS;
use jobtrail_core::activity::{executor, results, ActivityQuery};
use jobtrail_core::AppContext;
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;
const MAX_WINDOW_DAYS: i64 = 90;

/// Feature-off reads as a missing resource so the flag itself stays hidden.
fn feature_disabled() -> HttpResponse {
    HttpResponse::NotFound().json(ApiError::new("Not found"))
}

fn store_unavailable() -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(ApiError::new("Activity log temporarily unavailable"))
}

fn bad_request(msg: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError::new(msg))
}

fn error_response(err: ActivityError) -> HttpResponse {
    match err {
        ActivityError::FeatureDisabled => feature_disabled(),
        ActivityError::StoreUnavailable(_) => store_unavailable(),
        ActivityError::MissingScope => {
            bad_request("No API key scope is associated with this credential")
        }
        ActivityError::Validation(msg) => bad_request(msg),
    }
}

/// Parse a window bound. A date-only literal expands to the start or end of
/// that day; a full timestamp parses directly.
fn parse_bound(raw: &str, is_end: bool) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let (h, m, s) = if is_end { (23, 59, 59) } else { (0, 0, 0) };
        if let Some(dt) = date.and_hms_opt(h, m, s) {
            return Ok(dt.and_utc());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    Err(format!(
        "'{}' is not a valid ISO date or date-time",
        trimmed
    ))
}

fn validate_list_params(
    api_key_id: u64,
    params: &ActivityListParams,
) -> Result<ActivityQuery, String> {
    let start_raw = params
        .start_date
        .as_deref()
        .ok_or("start_date is required")?;
    let end_raw = params.end_date.as_deref().ok_or("end_date is required")?;

    let start = parse_bound(start_raw, false).map_err(|e| format!("start_date: {}", e))?;
    let end = parse_bound(end_raw, true).map_err(|e| format!("end_date: {}", e))?;

    if end < start {
        return Err("end_date must not be before start_date".to_string());
    }
    // The 90-day boundary itself is accepted.
    if end - start > Duration::days(MAX_WINDOW_DAYS) {
        return Err(format!(
            "date window must not exceed {} days",
            MAX_WINDOW_DAYS
        ));
    }

    let mode = match params.mode.as_deref() {
        None => None,
        Some(raw) => Some(
            JobKind::parse(raw).ok_or_else(|| format!("'{}' is not a valid mode", raw))?,
        ),
    };

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as u32;
    let offset = params.offset.unwrap_or(0).clamp(0, i64::from(u32::MAX)) as u32;

    Ok(ActivityQuery {
        api_key_id,
        start,
        end,
        mode,
        search: params.search.clone(),
        limit,
        offset,
    })
}

/// GET /v1/activity/jobs - unified, paginated activity history.
#[get("/jobs")]
pub async fn list_activity(
    identity: Identity,
    params: web::Query<ActivityListParams>,
    ctx: web::Data<Arc<AppContext>>,
) -> impl Responder {
    if !ctx.config().activity.enabled {
        return feature_disabled();
    }
    let store = match ctx.analytics() {
        Some(store) => store.clone(),
        None => return store_unavailable(),
    };
    let api_key_id = match identity.0.api_key_id {
        Some(id) => id,
        None => return error_response(ActivityError::MissingScope),
    };

    let query = match validate_list_params(api_key_id, &params) {
        Ok(q) => q,
        Err(msg) => return bad_request(msg),
    };

    match executor::execute(store.as_ref(), &query).await {
        Ok(data) => HttpResponse::Ok().json(ActivityListResponse::new(data)),
        Err(err) => error_response(err),
    }
}

/// POST /v1/activity/jobs/results - bulk result retrieval.
///
/// Returns 200 with a per-id outcome array once validation passes; batch
/// partial failure is communicated only through that array.
#[post("/jobs/results")]
pub async fn bulk_job_results(
    identity: Identity,
    body: web::Json<BulkResultsRequest>,
    ctx: web::Data<Arc<AppContext>>,
) -> impl Responder {
    if !ctx.config().activity.enabled {
        return feature_disabled();
    }
    let store = match ctx.analytics() {
        Some(store) => store.clone(),
        None => return store_unavailable(),
    };
    let api_key_id = match identity.0.api_key_id {
        Some(id) => id,
        None => return error_response(ActivityError::MissingScope),
    };

    if body.job_ids.is_empty() || body.job_ids.len() > MAX_BATCH_IDS {
        return bad_request(format!(
            "job_ids must contain between 1 and {} ids",
            MAX_BATCH_IDS
        ));
    }

    let mut parsed = Vec::with_capacity(body.job_ids.len());
    for raw in &body.job_ids {
        match Uuid::parse_str(raw.trim()) {
            Ok(id) => parsed.push(id),
            Err(_) => return bad_request(format!("'{}' is not a valid job id", raw)),
        }
    }

    // Deduplicate, preserving first-occurrence order; the response carries
    // one row per distinct requested id.
    let mut seen = HashSet::with_capacity(parsed.len());
    let deduped: Vec<Uuid> = parsed.into_iter().filter(|id| seen.insert(*id)).collect();
    debug!(
        "bulk results: {} distinct ids for api_key_id={}",
        deduped.len(),
        api_key_id
    );

    match results::fetch_batch(store.as_ref(), ctx.result_fetcher(), api_key_id, &deduped).await {
        Ok(items) => {
            let rows: Vec<ResultRow> = items.into_iter().map(ResultRow::from).collect();
            HttpResponse::Ok().json(BulkResultsResponse::new(rows))
        }
        Err(err) => error_response(err),
    }
}
