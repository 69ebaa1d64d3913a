//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use serde::Serialize;
use std::time::Instant;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceHealth {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "mako")]
    pub service: String,
    #[schema(example = "0.1.0")]
    pub version: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessReport {
    #[schema(example = "ready")]
    pub status: String,
    pub checks: Checks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Checks {
    pub database: ProbeResult,
}

/// Outcome of a single dependency probe.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProbeResult {
    #[schema(example = "up")]
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    fn up(latency_ms: u64) -> Self {
        Self {
            status: "up".into(),
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    fn down(error: String) -> Self {
        Self {
            status: "down".into(),
            latency_ms: None,
            error: Some(error),
        }
    }

    fn is_up(&self) -> bool {
        self.status == "up"
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Simple health check", content_type = "text/plain"))
)]
pub async fn health_check_simple() -> &'static str {
    "OK"
}

#[utoipa::path(
    get,
    path = "/health/status",
    tag = "Health",
    responses((status = 200, description = "Service is healthy", body = ServiceHealth))
)]
pub async fn health_check() -> Json<ServiceHealth> {
    Json(ServiceHealth {
        status: "healthy".into(),
        service: "mako".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessReport),
        (status = 503, description = "Service is not ready", body = ReadinessReport)
    )
)]
pub async fn ready_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessReport>, (StatusCode, Json<ReadinessReport>)> {
    let database = probe_database(&state);
    let ready = database.is_up();

    let report = ReadinessReport {
        status: if ready { "ready" } else { "not_ready" }.into(),
        checks: Checks { database },
    };

    if ready {
        Ok(Json(report))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(report)))
    }
}

fn probe_database(state: &AppState) -> ProbeResult {
    let start = Instant::now();

    let mut conn = match state.db_pool.get() {
        Ok(conn) => conn,
        Err(e) => return ProbeResult::down(format!("Failed to get connection: {e}")),
    };

    match diesel::sql_query("SELECT 1").execute(&mut conn) {
        Ok(_) => ProbeResult::up(start.elapsed().as_millis() as u64),
        Err(e) => ProbeResult::down(format!("Query failed: {e}")),
    }
}

#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Service is alive"))
)]
pub async fn live_check() -> StatusCode {
    StatusCode::OK
}
