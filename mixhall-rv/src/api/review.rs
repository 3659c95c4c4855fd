//! Reviewer decision endpoints

use axum::extract::{Path, State};
use axum::Json;
use mixhall_common::db::submissions::Submission;
use serde::Deserialize;

use crate::api::ApiError;
use crate::{workflow, AppState};

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

/// POST /api/submissions/:id/approve
///
/// Applies the submission snapshot to the catalog and marks the
/// submission Approved, all in one transaction.
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<Submission>, ApiError> {
    let submission = workflow::approve(&state.db, id, req.comment).await?;
    Ok(Json(submission))
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Absent and blank are equivalent; both fail with MissingComment
    #[serde(default)]
    pub comment: Option<String>,
}

/// POST /api/submissions/:id/reject
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<Submission>, ApiError> {
    let comment = req.comment.as_deref().unwrap_or("");
    let submission = workflow::reject(&state.db, id, comment).await?;
    Ok(Json(submission))
}
