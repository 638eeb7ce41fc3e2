// Jobtrail Store
//
// Clients for the three backends the activity log reads from:
// - the ClickHouse analytical store (HTTP interface, bound parameters)
// - the primary archival result tier (object storage, GCS or local)
// - the secondary low-latency tier (extract coordinator HTTP service)
//
// All clients are stateless aside from their underlying connection pools and
// are constructed once per process at bootstrap.

pub mod analytics;
pub mod archive;
pub mod error;
pub mod extract_state;

pub use analytics::{AnalyticsStore, ClickHouseClient, ParamBag, ParamValue, RawRow};
pub use archive::ArchiveTier;
pub use error::StoreError;
pub use extract_state::ExtractStateClient;

use serde_json::Value as JsonValue;
use uuid::Uuid;

/// One of the two storage tiers that can hold a finalized (or in-flight)
/// job result payload.
///
/// Absence is a normal outcome; only storage-communication failures are
/// errors.
#[async_trait::async_trait]
pub trait ResultTier: Send + Sync {
    async fn get(&self, job_id: Uuid) -> Result<Option<JsonValue>, StoreError>;
}
