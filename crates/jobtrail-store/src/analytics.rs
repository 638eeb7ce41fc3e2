//! ClickHouse analytical store client.
//!
//! Queries go over the ClickHouse HTTP interface. Parameter values are never
//! interpolated into query text: the SQL carries `{name:Type}` placeholders
//! and values travel as `param_name` request parameters, so the server does
//! the binding and injection is structurally impossible.
//!
//! Results use the self-describing `JSONEachRow` format: one JSON object per
//! line, keyed by output column name.

use crate::error::StoreError;
use async_trait::async_trait;
use jobtrail_commons::config::AnalyticsSettings;
use log::debug;
use serde_json::Value as JsonValue;
use std::time::Duration;
use uuid::Uuid;

/// A raw result row as returned by the store.
pub type RawRow = serde_json::Map<String, JsonValue>;

/// A typed, named query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    UInt64(u64),
    Str(String),
    UuidArray(Vec<Uuid>),
}

impl ParamValue {
    /// Render the value in the form the ClickHouse HTTP interface expects
    /// for a `param_*` request parameter.
    fn render(&self) -> String {
        match self {
            ParamValue::UInt64(v) => v.to_string(),
            ParamValue::Str(s) => s.clone(),
            ParamValue::UuidArray(ids) => {
                let quoted: Vec<String> = ids.iter().map(|id| format!("'{}'", id)).collect();
                format!("[{}]", quoted.join(","))
            }
        }
    }
}

/// Ordered bag of named query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBag {
    entries: Vec<(String, ParamValue)>,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_u64(&mut self, name: &str, value: u64) {
        self.entries.push((name.to_string(), ParamValue::UInt64(value)));
    }

    pub fn push_str(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .push((name.to_string(), ParamValue::Str(value.into())));
    }

    pub fn push_uuid_array(&mut self, name: &str, ids: &[Uuid]) {
        self.entries
            .push((name.to_string(), ParamValue::UuidArray(ids.to_vec())));
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// `("param_<name>", rendered_value)` pairs for the HTTP interface.
    pub fn as_http_params(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(name, value)| (format!("param_{}", name), value.render()))
            .collect()
    }
}

/// Read access to the analytical store.
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// Execute a read query with bound parameters, returning all rows.
    async fn query_rows(&self, sql: &str, params: &ParamBag) -> Result<Vec<RawRow>, StoreError>;
}

/// ClickHouse-over-HTTP implementation of [`AnalyticsStore`].
pub struct ClickHouseClient {
    http: reqwest::Client,
    url: String,
    database: String,
    user: String,
    password: String,
}

impl ClickHouseClient {
    pub fn new(settings: &AnalyticsSettings) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.query_timeout_secs))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            url: settings.url.trim_end_matches('/').to_string(),
            database: settings.database.clone(),
            user: settings.user.clone(),
            password: settings.password.clone(),
        })
    }
}

#[async_trait]
impl AnalyticsStore for ClickHouseClient {
    async fn query_rows(&self, sql: &str, params: &ParamBag) -> Result<Vec<RawRow>, StoreError> {
        let mut request = self
            .http
            .post(&self.url)
            .query(&[
                ("database", self.database.as_str()),
                ("default_format", "JSONEachRow"),
            ])
            .query(&params.as_http_params())
            .body(sql.to_string());

        if !self.user.is_empty() {
            request = request
                .header("X-ClickHouse-User", &self.user)
                .header("X-ClickHouse-Key", &self.password);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(StoreError::Backend(format!(
                "status {}: {}",
                status.as_u16(),
                body.chars().take(500).collect::<String>()
            )));
        }

        let mut rows = Vec::new();
        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: JsonValue = serde_json::from_str(line)
                .map_err(|e| StoreError::Decode(format!("bad JSONEachRow line: {}", e)))?;
            match value {
                JsonValue::Object(map) => rows.push(map),
                other => {
                    return Err(StoreError::Decode(format!(
                        "expected object row, got {}",
                        other
                    )))
                }
            }
        }
        debug!("analytics query returned {} rows", rows.len());
        Ok(rows)
    }
}
