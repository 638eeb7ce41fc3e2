//! API routes configuration.
//!
//! All endpoints use the /v1 version prefix:
//! - GET  /v1/activity/jobs          - unified activity history (requires identity)
//! - POST /v1/activity/jobs/results  - bulk result retrieval (requires identity)
//! - GET  /v1/healthcheck            - health check endpoint

use crate::handlers;
use crate::middleware::IdentityMiddleware;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// Configure API routes for Jobtrail.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1")
            .route("/healthcheck", web::get().to(healthcheck_handler))
            .service(
                web::scope("/activity")
                    .wrap(IdentityMiddleware)
                    .service(handlers::list_activity)
                    .service(handlers::bulk_job_results),
            ),
    );
}

/// Health check endpoint handler.
async fn healthcheck_handler() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
    }))
}
