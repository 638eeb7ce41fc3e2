//! Primary archival result tier.
//!
//! Finalized result payloads for every job kind are archived as JSON blobs,
//! content-addressed by job id. Production uses GCS; tests and local
//! development use a filesystem root. Both sit behind the same
//! `object_store::ObjectStore` trait, so there is no backend branching past
//! construction.

use crate::error::StoreError;
use crate::ResultTier;
use async_trait::async_trait;
use jobtrail_commons::config::ArchiveSettings;
use log::debug;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

/// Object key prefix under which job results are archived.
const RESULT_PREFIX: &str = "job-results";

pub struct ArchiveTier {
    store: Arc<dyn ObjectStore>,
}

impl ArchiveTier {
    /// Build the tier from configuration.
    pub fn from_settings(settings: &ArchiveSettings) -> Result<Self, StoreError> {
        match settings.backend.as_str() {
            "gcs" => Self::gcs(&settings.bucket),
            "local" => Self::local(&settings.local_path),
            other => Err(StoreError::ObjectStore(format!(
                "unknown archive backend '{}'",
                other
            ))),
        }
    }

    pub fn gcs(bucket: &str) -> Result<Self, StoreError> {
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| StoreError::ObjectStore(e.to_string()))?;
        Ok(Self {
            store: Arc::new(store),
        })
    }

    pub fn local(root: &str) -> Result<Self, StoreError> {
        std::fs::create_dir_all(root)
            .map_err(|e| StoreError::ObjectStore(format!("create {}: {}", root, e)))?;
        let store = LocalFileSystem::new_with_prefix(root)
            .map_err(|e| StoreError::ObjectStore(e.to_string()))?;
        Ok(Self {
            store: Arc::new(store),
        })
    }

    fn key_for(job_id: Uuid) -> ObjectPath {
        ObjectPath::from(format!("{}/{}.json", RESULT_PREFIX, job_id))
    }
}

#[async_trait]
impl ResultTier for ArchiveTier {
    async fn get(&self, job_id: Uuid) -> Result<Option<JsonValue>, StoreError> {
        let key = Self::key_for(job_id);
        let result = match self.store.get(&key).await {
            Ok(r) => r,
            Err(object_store::Error::NotFound { .. }) => {
                debug!("archive miss for job {}", job_id);
                return Ok(None);
            }
            Err(e) => return Err(StoreError::ObjectStore(e.to_string())),
        };
        let bytes = result
            .bytes()
            .await
            .map_err(|e| StoreError::ObjectStore(e.to_string()))?;
        let payload: JsonValue = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Decode(format!("archived payload for {}: {}", job_id, e)))?;
        Ok(Some(payload))
    }
}
