/**
 * Health Routes
 * Liveness, readiness and a detailed report including the store access mode
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    state::{OpsSnapshot, SharedState},
    store::AccessMode,
};

/// Store check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCheck {
    pub status: String,
    pub mode: AccessMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub store: StoreCheck,
    pub cached_pages: usize,
    pub alerts: OpsSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

async fn check_store(state: &SharedState) -> StoreCheck {
    let mode = state.store.mode();
    match state.store.store().ping().await {
        Ok(duration) => StoreCheck {
            status: "healthy".to_string(),
            mode,
            response_time: Some(duration.as_millis() as u64),
            error: None,
        },
        Err(e) => StoreCheck {
            status: "unhealthy".to_string(),
            mode,
            response_time: None,
            error: Some(e.to_string()),
        },
    }
}

/// GET /health - Simple health ping
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/detailed
pub async fn health_detailed(State(state): State<SharedState>) -> impl IntoResponse {
    let store = check_store(&state).await;
    let status = if store.status == "healthy" { "ok" } else { "degraded" };

    Json(DetailedHealthResponse {
        status: status.to_string(),
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs(),
        store,
        cached_pages: state.pages.len().await,
        alerts: state.ops.snapshot(),
    })
}

/// GET /health/ready - ready when the store answers
pub async fn health_ready(State(state): State<SharedState>) -> impl IntoResponse {
    let store = check_store(&state).await;
    let ready = store.status == "healthy";

    let response = ReadyResponse {
        status: if ready { "ready" } else { "not ready" }.to_string(),
        timestamp: Utc::now(),
        uptime: state.started_at.elapsed().as_secs(),
        reason: store.error,
    };
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}
