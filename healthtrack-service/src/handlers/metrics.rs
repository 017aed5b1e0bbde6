use crate::services::metrics::get_metrics;
use axum::{http::header, response::IntoResponse};

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        get_metrics(),
    )
}
