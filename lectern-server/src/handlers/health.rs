use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;

use crate::infra::app_state::AppState;

pub async fn ping_handler() -> Result<Json<Value>, StatusCode> {
    info!("Ping endpoint called");
    Ok(Json(json!({
        "status": "ok",
        "message": "Lectern server is running",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// Readiness probe: reports uptime and database reachability. Returns 503
/// when the database check fails.
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let uptime_seconds = (Utc::now() - state.started_at).num_seconds();

    let mut health_status = json!({
        "status": "healthy",
        "service": "lectern-server",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": uptime_seconds,
        "checks": {}
    });

    let mut is_unhealthy = false;

    match state.database.ping().await {
        Ok(()) => {
            let stats = state.database.pool_stats();
            health_status["checks"]["database"] = json!({
                "status": "healthy",
                "pool_size": stats.size,
                "pool_idle": stats.idle,
            });
        }
        Err(e) => {
            health_status["checks"]["database"] = json!({
                "status": "unhealthy",
                "error": e.to_string(),
            });
            is_unhealthy = true;
        }
    }

    if is_unhealthy {
        health_status["status"] = json!("unhealthy");
        Err(StatusCode::SERVICE_UNAVAILABLE)
    } else {
        Ok(Json(health_status))
    }
}
