//! Executes the built activity query against the analytical store.

use super::{normalize, query_builder, ActivityQuery};
use jobtrail_commons::{ActivityError, JobRecord};
use jobtrail_store::AnalyticsStore;
use log::{debug, error};
use std::time::Instant;

/// Run the list query and shape its rows.
///
/// The call is timed for observability only. A store rejection surfaces
/// unchanged as `StoreUnavailable` with no retry: analytics reads are cheap
/// and idempotent, and retrying during an incident would amplify load.
pub async fn execute(
    store: &dyn AnalyticsStore,
    query: &ActivityQuery,
) -> Result<Vec<JobRecord>, ActivityError> {
    let built = query_builder::build(query);
    let started = Instant::now();

    let rows = store
        .query_rows(&built.sql, &built.params)
        .await
        .map_err(|e| {
            error!("activity list query failed: {}", e);
            ActivityError::store_unavailable(e.to_string())
        })?;

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    let records: Vec<JobRecord> = rows.iter().filter_map(normalize::normalize_row).collect();
    debug!(
        "activity list: {} rows ({} normalized) in {:.2}ms for api_key_id={}",
        rows.len(),
        records.len(),
        elapsed_ms,
        query.api_key_id
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use jobtrail_commons::JobKind;
    use jobtrail_store::{ParamBag, RawRow, StoreError};
    use serde_json::json;
    use std::sync::Mutex;

    struct FixedStore {
        rows: Vec<RawRow>,
        last_sql: Mutex<String>,
        fail: bool,
    }

    #[async_trait]
    impl AnalyticsStore for FixedStore {
        async fn query_rows(
            &self,
            sql: &str,
            _params: &ParamBag,
        ) -> Result<Vec<RawRow>, StoreError> {
            if self.fail {
                return Err(StoreError::Transport("connection refused".into()));
            }
            *self.last_sql.lock().unwrap() = sql.to_string();
            Ok(self.rows.clone())
        }
    }

    fn query() -> ActivityQuery {
        ActivityQuery {
            api_key_id: 7,
            start: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 1, 31, 23, 59, 59).unwrap(),
            mode: None,
            search: None,
            limit: 100,
            offset: 0,
        }
    }

    fn obj(v: serde_json::Value) -> RawRow {
        match v {
            serde_json::Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn normalizes_rows_and_skips_broken_ones() {
        let store = FixedStore {
            rows: vec![
                obj(json!({
                    "job_id": "11111111-2222-3333-4444-555555555555",
                    "kind": "crawl",
                    "created_at": "2026-01-10 08:00:00",
                    "success": 1,
                    "num_docs": "25",
                    "error_count": 2,
                    "api_key_id": 7
                })),
                obj(json!({"job_id": "not-a-uuid", "kind": "crawl", "created_at": "2026-01-10 08:00:00"})),
            ],
            last_sql: Mutex::new(String::new()),
            fail: false,
        };

        let records = execute(&store, &query()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, JobKind::Crawl);
        assert_eq!(records[0].num_docs, Some(25));
        assert!(store.last_sql.lock().unwrap().contains("WITH page AS"));
    }

    #[tokio::test]
    async fn store_rejection_surfaces_as_store_unavailable() {
        let store = FixedStore {
            rows: vec![],
            last_sql: Mutex::new(String::new()),
            fail: true,
        };
        let err = execute(&store, &query()).await.unwrap_err();
        assert!(matches!(err, ActivityError::StoreUnavailable(_)));
    }
}
