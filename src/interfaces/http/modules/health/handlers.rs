//! Health check handler

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde::Serialize;
use utoipa::ToSchema;

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    pub db: DatabaseConnection,
    pub started_at: Arc<Instant>,
}

/// Service health response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: ComponentHealth,
}

/// Component health status
#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is degraded", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let uptime = state.started_at.elapsed().as_secs();

    let started = Instant::now();
    let db_ok = state
        .db
        .execute(Statement::from_string(
            state.db.get_database_backend(),
            "SELECT 1",
        ))
        .await
        .is_ok();
    let latency = started.elapsed().as_millis() as u64;

    let database = ComponentHealth {
        status: if db_ok { "up" } else { "down" }.to_string(),
        latency_ms: db_ok.then_some(latency),
    };

    let (status_code, status) = if db_ok {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime,
            database,
        }),
    )
}
