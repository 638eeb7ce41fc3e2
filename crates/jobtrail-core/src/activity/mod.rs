//! Unified activity history across the eight job kinds.
//!
//! Components, leaves first:
//! - [`normalize`] — null-on-failure type coercion for raw store rows.
//! - [`query_builder`] — pure filter-parameters -> (sql, bound params).
//! - [`executor`] — runs the built query, times it, normalizes rows.
//! - [`ownership`] — api_key_id + job ids -> owned ids mapped to kinds.
//! - [`results`] — tiered payload retrieval and the bulk fan-out.

pub mod executor;
pub mod normalize;
pub mod ownership;
pub mod query_builder;
pub mod results;

use chrono::{DateTime, Utc};
use jobtrail_commons::JobKind;

/// Validated inputs for a list query.
///
/// Construction happens at the API layer, which has already enforced
/// `start <= end`, a window of at most 90 days, `limit` in `[1, 500]`, and a
/// nonnegative `offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityQuery {
    pub api_key_id: u64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub mode: Option<JobKind>,
    pub search: Option<String>,
    pub limit: u32,
    pub offset: u32,
}
