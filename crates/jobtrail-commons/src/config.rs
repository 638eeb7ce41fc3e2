// Configuration module
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main server configuration, loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub activity: ActivitySettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
    #[serde(default)]
    pub archive: ArchiveSettings,
    #[serde(default)]
    pub extract_state: ExtractStateSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Activity-log feature settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySettings {
    /// Master switch for the activity-history endpoints. When off, the
    /// endpoints report 404 as if they did not exist.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Analytical store (ClickHouse HTTP interface) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSettings {
    /// Base URL of the ClickHouse HTTP interface, e.g. "http://127.0.0.1:8123".
    /// Empty means the store is not configured and activity endpoints
    /// report 503.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Per-query timeout in seconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

/// Primary archival result tier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveSettings {
    /// "gcs" or "local" (local is intended for development and tests).
    #[serde(default = "default_archive_backend")]
    pub backend: String,
    /// GCS bucket name when backend = "gcs".
    #[serde(default)]
    pub bucket: String,
    /// Filesystem root when backend = "local".
    #[serde(default = "default_archive_path")]
    pub local_path: String,
}

/// Secondary low-latency tier (extract coordinator) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractStateSettings {
    /// Base URL of the internal extract coordinator. Empty disables the
    /// secondary tier; extract jobs then resolve from the archive only.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_state_timeout")]
    pub request_timeout_secs: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8320
}

fn default_workers() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_database() -> String {
    "jobtrail".to_string()
}

fn default_query_timeout() -> u64 {
    30
}

fn default_archive_backend() -> String {
    "local".to_string()
}

fn default_archive_path() -> String {
    "./data/job-results".to_string()
}

fn default_state_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            database: default_database(),
            user: String::new(),
            password: String::new(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            backend: default_archive_backend(),
            bucket: String::new(),
            local_path: default_archive_path(),
        }
    }
}

impl Default for ExtractStateSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout_secs: default_state_timeout(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            activity: ActivitySettings::default(),
            analytics: AnalyticsSettings::default(),
            archive: ArchiveSettings::default(),
            extract_state: ExtractStateSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Load from file when present, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(cfg) => cfg,
            Err(_) => Self::default(),
        }
    }

    /// Whether the analytical store is configured at all.
    pub fn analytics_configured(&self) -> bool {
        !self.analytics.url.trim().is_empty()
    }
}
