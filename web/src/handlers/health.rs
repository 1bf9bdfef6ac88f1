//! Health and metrics endpoints.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use clubhouse_portal::Backend;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Signed-in portal clients
    pub open_sessions: usize,
}

/// Liveness check. Does not contact the providers.
///
/// ```text
/// GET /health
/// {"status":"ok","version":"0.1.0","openSessions":3}
/// ```
pub async fn health_check<B: Backend>(
    State(state): State<AppState<B>>,
) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            open_sessions: state.sessions.len().await,
        }),
    )
}

/// Prometheus text exposition.
///
/// ```text
/// GET /metrics
/// ```
pub async fn metrics<B: Backend>(State(state): State<AppState<B>>) -> String {
    state.metrics.render()
}
