//! Jobtrail server entrypoint.
//!
//! The heavy lifting (client initialization, server wiring) lives in
//! `lifecycle`; this file loads configuration, initializes logging, and
//! starts the server.

mod lifecycle;
mod logging;

use anyhow::Result;
use jobtrail_commons::ServerConfig;
use log::{info, warn};

#[actix_web::main]
async fn main() -> Result<()> {
    let config_path =
        std::env::var("JOBTRAIL_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = match ServerConfig::from_file(&config_path) {
        Ok(cfg) => cfg,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ServerConfig::default(),
        Err(e) => {
            eprintln!("FATAL: failed to load {}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    // Logging before any other side effects
    logging::init_logging(&config.logging.level, &config.logging.format)?;

    info!(
        "Jobtrail Server v{} starting (config: {})",
        env!("CARGO_PKG_VERSION"),
        config_path
    );
    if !config.activity.enabled {
        warn!("activity endpoints are disabled by configuration");
    }

    let ctx = lifecycle::bootstrap(config)?;
    lifecycle::run(ctx).await
}
