//! Review queue endpoints

use axum::extract::{Query, State};
use axum::Json;
use mixhall_common::Error;
use serde::Deserialize;

use crate::api::ApiError;
use crate::queue::{self, Cursor, QueuePage};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub cursor: Option<String>,
}

fn default_limit() -> i64 {
    20
}

/// GET /api/queue/pending
///
/// Reviewer triage queue: pending submissions, oldest first.
pub async fn pending(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<QueuePage>, ApiError> {
    let cursor = decode_cursor(query.cursor.as_deref())?;
    let mut conn = state.db.acquire().await.map_err(Error::from)?;
    let page = queue::pending_for_reviewers(&mut conn, query.limit, cursor).await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub submitter_id: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub cursor: Option<String>,
}

/// GET /api/queue/history
///
/// A submitter's own requests across all statuses, newest first.
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<QueuePage>, ApiError> {
    let cursor = decode_cursor(query.cursor.as_deref())?;
    let mut conn = state.db.acquire().await.map_err(Error::from)?;
    let page =
        queue::history_for_submitter(&mut conn, query.submitter_id, query.limit, cursor).await?;
    Ok(Json(page))
}

fn decode_cursor(raw: Option<&str>) -> Result<Option<Cursor>, ApiError> {
    match raw {
        Some(raw) => Ok(Some(Cursor::decode(raw)?)),
        None => Ok(None),
    }
}
