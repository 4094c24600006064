use crate::services::metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

const SERVICE_NAME: &str = "visa-assistant";

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe: the model provider must be reachable.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.provider.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "provider": state.provider.name(),
                "model": state.provider.model()
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Provider health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "provider": state.provider.name(),
                    "error": e.to_string()
                })),
            )
        }
    }
}

pub async fn metrics_handler() -> impl IntoResponse {
    metrics::get_metrics()
}
