//! Submission endpoints: submit, detail, filtered list

use axum::extract::{Path, Query, State};
use axum::Json;
use mixhall_common::db::submissions::{self, ReviewStatus, Submission, SubmissionFilter, SubmissionKind};
use mixhall_common::payload::SongDraft;
use mixhall_common::Error;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::{workflow, AppState};

/// POST /api/submissions request body
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub submitter_id: i64,
    pub kind: SubmissionKind,
    pub target_display_id: Option<String>,
    pub draft: SongDraft,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: i64,
    pub target_display_id: String,
    pub status: ReviewStatus,
}

/// POST /api/submissions
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let submission = workflow::submit(
        &state.db,
        workflow::SubmitRequest {
            submitter_id: req.submitter_id,
            kind: req.kind,
            target_display_id: req.target_display_id,
            draft: req.draft,
        },
    )
    .await?;

    Ok(Json(SubmitResponse {
        id: submission.id,
        target_display_id: submission.target_display_id,
        status: submission.status,
    }))
}

/// GET /api/submissions/:id
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Submission>, ApiError> {
    let mut conn = state.db.acquire().await.map_err(Error::from)?;
    let submission = submissions::get(&mut conn, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("submission {} not found", id)))?;
    Ok(Json(submission))
}

/// GET /api/submissions query parameters
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub submitter_id: Option<i64>,
    pub status: Option<ReviewStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub data: Vec<Submission>,
    pub total: i64,
}

/// GET /api/submissions
///
/// Ordered by submit time descending, ties broken by id.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let filter = SubmissionFilter {
        submitter_id: query.submitter_id,
        status: query.status,
    };
    let limit = query.limit.clamp(1, 50);
    let offset = query.offset.max(0);

    let mut conn = state.db.acquire().await.map_err(Error::from)?;
    let data = submissions::list(&mut conn, filter, limit, offset).await?;
    let total = submissions::count(&mut conn, filter).await?;
    Ok(Json(ListResponse { data, total }))
}
