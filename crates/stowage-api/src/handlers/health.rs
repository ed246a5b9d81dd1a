//! Health endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct HealthCheckResponse {
    status: &'static str,
    database: String,
    containers: usize,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut overall_healthy = true;

    // Check database using the pool directly with timeout
    let database = match tokio::time::timeout(
        TIMEOUT,
        sqlx::query("SELECT 1").execute(&state.pool),
    )
    .await
    {
        Ok(Ok(_)) => "healthy".to_string(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database health check failed");
            overall_healthy = false;
            format!("unhealthy: {e}")
        }
        Err(_) => {
            tracing::error!("Database health check timed out");
            overall_healthy = false;
            "timeout".to_string()
        }
    };

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthCheckResponse {
            status: if overall_healthy { "healthy" } else { "unhealthy" },
            database,
            containers: state.buckets.names().len(),
        }),
    )
}
