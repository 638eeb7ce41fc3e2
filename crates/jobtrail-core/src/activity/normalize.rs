//! Null-on-failure coercion of raw store rows into `JobRecord`s.
//!
//! The analytical store returns self-describing JSON rows whose scalar types
//! drift across schema versions (numbers arrive as numbers or strings, the
//! scrape options column holds either JSON text or an already-structured
//! object). Every coercion here degrades to `None` instead of raising; only
//! a row whose identity columns (id, kind, created_at) are unusable is
//! dropped, with a warning.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use jobtrail_commons::models::job_record::DEFAULT_AGENT_MODEL;
use jobtrail_commons::{JobKind, JobRecord};
use jobtrail_store::RawRow;
use log::warn;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Numeric coercion: numbers pass through, numeric strings parse, anything
/// else (including null) is `None`.
pub fn lossy_f64(value: Option<&JsonValue>) -> Option<f64> {
    match value? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Integer coercion; fractional inputs truncate toward zero.
pub fn lossy_i64(value: Option<&JsonValue>) -> Option<i64> {
    match value? {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        JsonValue::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

/// Boolean coercion for the tri-state success column: null stays unknown,
/// numbers follow nonzero-is-true.
fn lossy_bool(value: Option<&JsonValue>) -> Option<bool> {
    match value? {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0),
        JsonValue::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            other => other.parse::<f64>().ok().map(|f| f != 0.0),
        },
        _ => None,
    }
}

fn opt_string(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// The scrape options column as stored: older writers serialized JSON text,
/// newer ones write a structured object. Resolved exactly once here instead
/// of branching at each use site.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOptionsRaw {
    Encoded(String),
    Structured(JsonValue),
    Absent,
}

impl ScrapeOptionsRaw {
    pub fn from_value(value: Option<&JsonValue>) -> Self {
        match value {
            None | Some(JsonValue::Null) => ScrapeOptionsRaw::Absent,
            Some(JsonValue::String(s)) => ScrapeOptionsRaw::Encoded(s.clone()),
            Some(other) => ScrapeOptionsRaw::Structured(other.clone()),
        }
    }

    /// Resolve to a structured value; malformed encoded text degrades to
    /// `None` silently.
    pub fn resolve(self) -> Option<JsonValue> {
        match self {
            ScrapeOptionsRaw::Absent => None,
            ScrapeOptionsRaw::Structured(v) => Some(v),
            ScrapeOptionsRaw::Encoded(s) => serde_json::from_str(&s).ok(),
        }
    }
}

/// Parse the store's DateTime64 text form, falling back to RFC 3339 and
/// plain dates.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(fixed) = DateTime::parse_from_rfc3339(s) {
        return Some(fixed.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

fn str_field<'a>(row: &'a RawRow, key: &str) -> Option<&'a str> {
    row.get(key).and_then(|v| v.as_str())
}

/// Shape one raw row into a `JobRecord`.
///
/// Returns `None` (dropping the row) only when the identity columns are
/// missing or unparseable; every other defect degrades to a null field.
pub fn normalize_row(row: &RawRow) -> Option<JobRecord> {
    let job_id = match str_field(row, "job_id").and_then(|s| Uuid::parse_str(s).ok()) {
        Some(id) => id,
        None => {
            warn!("activity row dropped: unparseable job_id");
            return None;
        }
    };
    let kind = match str_field(row, "kind").and_then(JobKind::parse) {
        Some(kind) => kind,
        None => {
            warn!("activity row {} dropped: unknown kind", job_id);
            return None;
        }
    };
    let created_at = match str_field(row, "created_at").and_then(parse_timestamp) {
        Some(ts) => ts,
        None => {
            warn!("activity row {} dropped: unparseable created_at", job_id);
            return None;
        }
    };

    let agent_model = match kind {
        // Agent jobs always report a model; the platform default stands in
        // when the run never recorded one.
        JobKind::Agent => opt_string(row.get("agent_model"))
            .or_else(|| Some(DEFAULT_AGENT_MODEL.to_string())),
        _ => None,
    };

    Some(JobRecord {
        job_id,
        kind,
        created_at,
        origin: opt_string(row.get("origin")),
        url_or_query: opt_string(row.get("url_or_query")),
        success: lossy_bool(row.get("success")),
        credits_billed: lossy_f64(row.get("credits_billed")),
        num_docs: lossy_i64(row.get("num_docs")),
        time_taken: lossy_f64(row.get("time_taken")),
        message: opt_string(row.get("message")),
        error_count: lossy_i64(row.get("error_count")),
        agent_model,
        scrape_options: ScrapeOptionsRaw::from_value(row.get("scrape_options")).resolve(),
        scrape_pdf_num_pages: lossy_i64(row.get("scrape_pdf_num_pages")),
        api_key_id: lossy_i64(row.get("api_key_id")).unwrap_or(0),
    })
}
