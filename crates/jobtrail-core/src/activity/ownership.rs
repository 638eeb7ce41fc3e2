//! Ownership resolution: which of the requested job ids belong to the
//! calling credential, and what kind is each.
//!
//! An id absent from the result is either nonexistent or owned by a
//! different credential. The two cases are deliberately indistinguishable so
//! the endpoint cannot be used to probe for the existence of other tenants'
//! jobs.

use jobtrail_commons::{ActivityError, JobKind};
use jobtrail_store::{AnalyticsStore, ParamBag};
use log::warn;
use std::collections::HashMap;
use uuid::Uuid;

/// Upper bound on a single ownership lookup; mirrors the bulk endpoint's
/// batch limit.
pub const MAX_BATCH_IDS: usize = 100;

// The tenant check belongs in HAVING, on the collapsed row: filtering
// version rows by api_key_id before the argMax would compute last-write-wins
// over only the caller's versions, so stale versions of a since-reassigned
// job would still resolve as owned.
const OWNERSHIP_SQL: &str = "SELECT id, argMax(kind, version) AS kind
FROM requests
WHERE id IN {job_ids:Array(UUID)}
GROUP BY id
HAVING argMax(api_key_id, version) = {api_key_id:UInt64}
   AND argMax(is_deleted, version) = 0";

/// Resolve ownership for a batch of job ids.
///
/// Empty input returns an empty map without touching the store.
pub async fn resolve(
    store: &dyn AnalyticsStore,
    api_key_id: u64,
    job_ids: &[Uuid],
) -> Result<HashMap<Uuid, JobKind>, ActivityError> {
    if job_ids.is_empty() {
        return Ok(HashMap::new());
    }
    if job_ids.len() > MAX_BATCH_IDS {
        return Err(ActivityError::validation(format!(
            "at most {} job ids per request",
            MAX_BATCH_IDS
        )));
    }

    let mut params = ParamBag::new();
    params.push_u64("api_key_id", api_key_id);
    params.push_uuid_array("job_ids", job_ids);

    let rows = store
        .query_rows(OWNERSHIP_SQL, &params)
        .await
        .map_err(|e| ActivityError::store_unavailable(e.to_string()))?;

    let mut owned = HashMap::with_capacity(rows.len());
    for row in rows {
        let id = row
            .get("id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());
        let kind = row
            .get("kind")
            .and_then(|v| v.as_str())
            .and_then(JobKind::parse);
        match (id, kind) {
            (Some(id), Some(kind)) => {
                owned.insert(id, kind);
            }
            _ => warn!("ownership row with unusable id/kind skipped"),
        }
    }
    Ok(owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use jobtrail_store::{ParamValue, RawRow, StoreError};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        rows: Vec<RawRow>,
        calls: AtomicUsize,
        last_params: Mutex<Option<ParamBag>>,
    }

    #[async_trait]
    impl AnalyticsStore for RecordingStore {
        async fn query_rows(
            &self,
            _sql: &str,
            params: &ParamBag,
        ) -> Result<Vec<RawRow>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_params.lock().unwrap() = Some(params.clone());
            Ok(self.rows.clone())
        }
    }

    fn obj(v: serde_json::Value) -> RawRow {
        match v {
            serde_json::Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn tenant_check_applies_to_the_collapsed_row() {
        // Versions {v1: api_key_id=A, v2: api_key_id=B} for one id must not
        // resolve as owned by A: the ownership predicate has to see the
        // last-write-wins value, not any historical version.
        assert!(OWNERSHIP_SQL.contains("HAVING argMax(api_key_id, version) = {api_key_id:UInt64}"));
        let where_clause = OWNERSHIP_SQL
            .split("GROUP BY")
            .next()
            .unwrap();
        assert!(
            !where_clause.contains("api_key_id ="),
            "api_key_id must not filter version rows before aggregation"
        );
    }

    #[tokio::test]
    async fn empty_input_makes_no_store_call() {
        let store = RecordingStore::default();
        let owned = resolve(&store, 42, &[]).await.unwrap();
        assert!(owned.is_empty());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_before_any_store_call() {
        let store = RecordingStore::default();
        let ids: Vec<Uuid> = (0..101).map(|_| Uuid::new_v4()).collect();
        let err = resolve(&store, 42, &ids).await.unwrap_err();
        assert!(matches!(err, ActivityError::Validation(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn maps_owned_ids_to_kinds_and_binds_the_batch() {
        let id = Uuid::parse_str("11111111-2222-3333-4444-555555555555").unwrap();
        let store = RecordingStore {
            rows: vec![obj(json!({"id": id.to_string(), "kind": "extract"}))],
            ..Default::default()
        };
        let other = Uuid::new_v4();
        let owned = resolve(&store, 42, &[id, other]).await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned.get(&id), Some(&JobKind::Extract));
        // The id the store did not return is simply absent; the caller
        // cannot tell foreign-owned from nonexistent.
        assert!(!owned.contains_key(&other));

        let params = store.last_params.lock().unwrap().clone().unwrap();
        assert_eq!(params.get("api_key_id"), Some(&ParamValue::UInt64(42)));
        assert_eq!(
            params.get("job_ids"),
            Some(&ParamValue::UuidArray(vec![id, other]))
        );
    }
}
