//! Secondary low-latency result tier.
//!
//! The extract coordinator keeps still-in-flight or not-yet-archived
//! structured-extraction state. The activity log consults it only for
//! `extract` jobs whose payload is not in the archive yet. A 404 from the
//! coordinator is a normal miss, not an error.

use crate::error::StoreError;
use crate::ResultTier;
use async_trait::async_trait;
use jobtrail_commons::config::ExtractStateSettings;
use log::debug;
use reqwest::StatusCode;
use serde_json::Value as JsonValue;
use std::time::Duration;
use uuid::Uuid;

pub struct ExtractStateClient {
    http: reqwest::Client,
    base_url: String,
}

impl ExtractStateClient {
    pub fn new(settings: &ExtractStateSettings) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ResultTier for ExtractStateClient {
    async fn get(&self, job_id: Uuid) -> Result<Option<JsonValue>, StoreError> {
        let url = format!("{}/v1/extracts/{}/state", self.base_url, job_id);
        let response = self.http.get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("extract state miss for job {}", job_id);
                Ok(None)
            }
            status if status.is_success() => {
                let payload = response
                    .json::<JsonValue>()
                    .await
                    .map_err(|e| StoreError::Decode(e.to_string()))?;
                Ok(Some(payload))
            }
            status => Err(StoreError::Backend(format!(
                "extract coordinator returned {}",
                status.as_u16()
            ))),
        }
    }
}
