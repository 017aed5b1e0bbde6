use crate::dtos::{EntriesParams, EntryResponse, LogRequest};
use crate::parsing::{build_entry, resolve_since};
use crate::services::metrics::record_entry_logged;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use validator::Validate;

/// Parse a free-text message and store the resulting entry.
pub async fn create_log(
    State(state): State<AppState>,
    Json(payload): Json<LogRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    tracing::Span::current().record("user_id", payload.user_id.as_str());

    let entry = build_entry(
        &payload.user_id,
        &payload.message,
        Utc::now(),
        state.config.user_timezone,
    )?;

    let id = state.db.add_log(&entry).await?;
    let stored = state.db.get_log(&id).await?.ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!("Entry {} missing after insert", id))
    })?;

    record_entry_logged();

    Ok((StatusCode::CREATED, Json(EntryResponse::from(stored))))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Query(params): Query<EntriesParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    tracing::Span::current().record("user_id", params.user_id.as_str());

    let since = params
        .since
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| resolve_since(s, Utc::now(), state.config.user_timezone))
        .transpose()?;

    let entries = state.db.list_logs(&params.user_id, since).await?;

    Ok(Json(
        entries
            .into_iter()
            .map(EntryResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let entry = state
        .db
        .get_log(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Entry {} not found", id)))?;

    Ok(Json(EntryResponse::from(entry)))
}
