//! Process-wide shared clients.
//!
//! Store clients are stateless aside from their connection pools, so one
//! instance of each is constructed at bootstrap and passed by injection
//! (`web::Data` at the API layer). Nothing here is an ambient singleton;
//! tests inject mock stores through [`AppContext::with_clients`].

use crate::activity::results::ResultFetcher;
use jobtrail_commons::ServerConfig;
use jobtrail_store::{
    AnalyticsStore, ArchiveTier, ClickHouseClient, ExtractStateClient, ResultTier, StoreError,
};
use log::info;
use std::sync::Arc;

pub struct AppContext {
    config: Arc<ServerConfig>,
    analytics: Option<Arc<dyn AnalyticsStore>>,
    result_fetcher: ResultFetcher,
}

impl AppContext {
    /// Construct all shared clients from configuration, once per process.
    pub fn init(config: ServerConfig) -> Result<Arc<Self>, StoreError> {
        let config = Arc::new(config);

        let analytics: Option<Arc<dyn AnalyticsStore>> = if config.analytics_configured() {
            info!("analytics store configured at {}", config.analytics.url);
            Some(Arc::new(ClickHouseClient::new(&config.analytics)?))
        } else {
            info!("analytics store not configured; activity endpoints will report 503");
            None
        };

        let archive: Arc<dyn ResultTier> = Arc::new(ArchiveTier::from_settings(&config.archive)?);
        let extract_state: Option<Arc<dyn ResultTier>> =
            if config.extract_state.base_url.trim().is_empty() {
                None
            } else {
                Some(Arc::new(ExtractStateClient::new(&config.extract_state)?))
            };
        let result_fetcher = ResultFetcher::new(archive, extract_state);

        Ok(Arc::new(Self {
            config,
            analytics,
            result_fetcher,
        }))
    }

    /// Assemble a context from pre-built clients. Used by tests and by any
    /// embedding that wants to supply its own store implementations.
    pub fn with_clients(
        config: ServerConfig,
        analytics: Option<Arc<dyn AnalyticsStore>>,
        result_fetcher: ResultFetcher,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            analytics,
            result_fetcher,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// `None` when the analytical store is not configured or reachable by
    /// construction; callers surface that as service-unavailable.
    pub fn analytics(&self) -> Option<&Arc<dyn AnalyticsStore>> {
        self.analytics.as_ref()
    }

    pub fn result_fetcher(&self) -> &ResultFetcher {
        &self.result_fetcher
    }
}
