//! Server lifecycle management helpers.
//!
//! Bootstraps the shared store clients and wires the HTTP server so that
//! `main.rs` stays a thin orchestrator.

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use jobtrail_api::routes::configure_routes;
use jobtrail_commons::ServerConfig;
use jobtrail_core::AppContext;
use log::info;
use std::sync::Arc;

/// Construct the shared application context from configuration.
///
/// All store clients are built here, once per process, and injected into the
/// HTTP workers by reference.
pub fn bootstrap(config: ServerConfig) -> Result<Arc<AppContext>> {
    let ctx = AppContext::init(config).context("failed to initialize store clients")?;
    Ok(ctx)
}

/// Run the HTTP server until it is shut down.
pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let host = ctx.config().server.host.clone();
    let port = ctx.config().server.port;
    let workers = ctx.config().server.workers;

    info!("Jobtrail API listening on {}:{} ({} workers)", host, port, workers);

    let data = web::Data::new(ctx);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .configure(configure_routes)
    })
    .workers(workers)
    .bind((host.as_str(), port))
    .with_context(|| format!("failed to bind {}:{}", host, port))?
    .run()
    .await
    .context("HTTP server terminated abnormally")
}
