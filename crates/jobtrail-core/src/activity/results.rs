//! Tiered result retrieval and the bulk fan-out.

use super::ownership;
use jobtrail_commons::{ActivityError, JobKind};
use jobtrail_store::{AnalyticsStore, ResultTier, StoreError};
use log::warn;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tokio::task::JoinSet;
use uuid::Uuid;

/// Retrieves one job's materialized payload from whichever tier holds it.
///
/// Precedence: the archival tier holds a finalized snapshot for every kind
/// and is always consulted first. Only the structured-extraction kind falls
/// back to the low-latency tier, which holds still-in-flight or
/// not-yet-archived extraction state; any other kind with no archive hit is
/// simply not found.
#[derive(Clone)]
pub struct ResultFetcher {
    archive: Arc<dyn ResultTier>,
    extract_state: Option<Arc<dyn ResultTier>>,
}

impl ResultFetcher {
    pub fn new(archive: Arc<dyn ResultTier>, extract_state: Option<Arc<dyn ResultTier>>) -> Self {
        Self {
            archive,
            extract_state,
        }
    }

    pub async fn fetch(&self, kind: JobKind, job_id: Uuid) -> Result<Option<JsonValue>, StoreError> {
        if let Some(payload) = self.archive.get(job_id).await? {
            return Ok(Some(payload));
        }
        if kind == JobKind::Extract {
            if let Some(tier) = &self.extract_state {
                return tier.get(job_id).await;
            }
        }
        Ok(None)
    }
}

/// Outcome for one id of a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Not in the caller's ownership scope (or nonexistent; the two are
    /// indistinguishable by design).
    UnauthorizedOrNotFound,
    /// Owned, but neither tier holds a payload.
    ResultNotFound { kind: JobKind },
    /// Owned and a payload was found.
    Found { kind: JobKind, payload: JsonValue },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkItem {
    pub job_id: Uuid,
    pub outcome: ItemOutcome,
}

/// Resolve ownership once for the batch, then fetch every owned id's payload
/// concurrently.
///
/// `job_ids` must already be deduplicated in first-occurrence order; the
/// output has exactly one item per input id, in input order, regardless of
/// completion order. Concurrency is naturally bounded by the batch cap of
/// [`ownership::MAX_BATCH_IDS`] ids. A tier failure for one id degrades that
/// item to `ResultNotFound` rather than failing the batch.
pub async fn fetch_batch(
    store: &dyn AnalyticsStore,
    fetcher: &ResultFetcher,
    api_key_id: u64,
    job_ids: &[Uuid],
) -> Result<Vec<BulkItem>, ActivityError> {
    let owned = ownership::resolve(store, api_key_id, job_ids).await?;

    let mut slots: Vec<Option<ItemOutcome>> = vec![None; job_ids.len()];
    let mut tasks: JoinSet<(usize, JobKind, Result<Option<JsonValue>, StoreError>)> =
        JoinSet::new();

    for (idx, job_id) in job_ids.iter().enumerate() {
        match owned.get(job_id) {
            None => slots[idx] = Some(ItemOutcome::UnauthorizedOrNotFound),
            Some(&kind) => {
                let fetcher = fetcher.clone();
                let job_id = *job_id;
                tasks.spawn(async move { (idx, kind, fetcher.fetch(kind, job_id).await) });
            }
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let (idx, kind, result) = joined
            .map_err(|e| ActivityError::store_unavailable(format!("result task failed: {}", e)))?;
        let outcome = match result {
            Ok(Some(payload)) => ItemOutcome::Found { kind, payload },
            Ok(None) => ItemOutcome::ResultNotFound { kind },
            Err(e) => {
                warn!("result fetch for {} failed: {}", job_ids[idx], e);
                ItemOutcome::ResultNotFound { kind }
            }
        };
        slots[idx] = Some(outcome);
    }

    // Assemble by input position, never by completion order.
    Ok(job_ids
        .iter()
        .zip(slots)
        .map(|(job_id, slot)| BulkItem {
            job_id: *job_id,
            outcome: slot.unwrap_or(ItemOutcome::UnauthorizedOrNotFound),
        })
        .collect())
}
