use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::time::Instant;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    store: ComponentHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn healthy(latency_ms: u64) -> Self {
        Self {
            status: "healthy".to_string(),
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            latency_ms: None,
            error: Some(error),
        }
    }
}

/// GET /api/health
///
/// Reports the store as healthy when a one-row read succeeds.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let store = match state.repos.readings.latest(1).await {
        Ok(_) => ComponentHealth::healthy(start.elapsed().as_millis() as u64),
        Err(e) => ComponentHealth::unhealthy(e.to_string()),
    };

    let healthy = store.status == "healthy";
    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now(),
        store,
    };
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(response))
}
