use crate::dtos::{SummaryParams, SummaryResponse};
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// Summarise a user's entries from the last `days` days.
///
/// Provider failures never reach the client; the response is flagged `degraded`.
pub async fn get_summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    tracing::Span::current().record("user_id", params.user_id.as_str());

    let question = params
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or(state.config.summary.default_question.as_str());

    let entries = state
        .db
        .summarize_window(&params.user_id, params.days, state.config.summary.max_entries)
        .await?;

    let summary = state
        .summarizer
        .summarize(&entries, question, params.days)
        .await;

    Ok(Json(SummaryResponse::from(summary)))
}
