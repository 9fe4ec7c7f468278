use actix_web::{web, HttpResponse, Responder};

use crate::models::HealthResponse;
use crate::routes::AppState;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let pg_healthy = match state.postgres.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            false
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: health_status(pg_healthy).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn health_status(database_healthy: bool) -> &'static str {
    if database_healthy {
        "healthy"
    } else {
        "degraded"
    }
}
