use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// Ready once the database answers. The summary provider is reported but
/// does not gate readiness, since summaries degrade without it.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let llm = match state.summarizer.provider_health().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(
                provider = state.summarizer.provider_name(),
                error = %e,
                "Summary provider health check failed"
            );
            "unavailable"
        }
    };

    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "service": "healthtrack-service",
                "version": env!("CARGO_PKG_VERSION"),
                "database": "ok",
                "llm": llm
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "ok": false, "database": "unavailable", "llm": llm })),
            )
        }
    }
}
