//! Submission repository: durable store of review requests
//!
//! One row per submission in `song_publishing_review`, holding the
//! proposed song snapshot and the lifecycle columns. The status integers
//! live only in this adapter; everything above works with the closed
//! enums.

use crate::error::is_unique_violation;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

/// Submission lifecycle status. Pending is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_i64(self) -> i64 {
        match self {
            ReviewStatus::Pending => 0,
            ReviewStatus::Approved => 1,
            ReviewStatus::Rejected => 2,
        }
    }

    pub fn from_i64(v: i64) -> Result<Self> {
        match v {
            0 => Ok(ReviewStatus::Pending),
            1 => Ok(ReviewStatus::Approved),
            2 => Ok(ReviewStatus::Rejected),
            other => Err(Error::Internal(format!("unknown review status {}", other))),
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ReviewStatus::Pending)
    }
}

/// Whether the submission creates a new song or modifies a published one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Create,
    Modify,
}

impl SubmissionKind {
    pub fn as_i64(self) -> i64 {
        match self {
            SubmissionKind::Create => 0,
            SubmissionKind::Modify => 1,
        }
    }

    pub fn from_i64(v: i64) -> Result<Self> {
        match v {
            0 => Ok(SubmissionKind::Create),
            1 => Ok(SubmissionKind::Modify),
            other => Err(Error::Internal(format!("unknown submission kind {}", other))),
        }
    }
}

/// Terminal decision a reviewer can take on a pending submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn status(self) -> ReviewStatus {
        match self {
            Decision::Approved => ReviewStatus::Approved,
            Decision::Rejected => ReviewStatus::Rejected,
        }
    }
}

/// One review request as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub submitter_id: i64,
    pub target_display_id: String,
    pub kind: SubmissionKind,
    /// Raw snapshot document; decoded into a typed payload by the workflow
    pub payload: Value,
    pub status: ReviewStatus,
    pub review_comment: Option<String>,
    pub submit_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub review_time: Option<DateTime<Utc>>,
}

fn row_to_submission(row: &SqliteRow) -> Result<Submission> {
    Ok(Submission {
        id: row.try_get("id")?,
        submitter_id: row.try_get("submitter_id")?,
        target_display_id: row.try_get("target_display_id")?,
        kind: SubmissionKind::from_i64(row.try_get("kind")?)?,
        payload: row.try_get("payload")?,
        status: ReviewStatus::from_i64(row.try_get("status")?)?,
        review_comment: row.try_get("review_comment")?,
        submit_time: row.try_get("submit_time")?,
        update_time: row.try_get("update_time")?,
        review_time: row.try_get("review_time")?,
    })
}

/// List filter for [`list`] and [`count`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmissionFilter {
    pub submitter_id: Option<i64>,
    pub status: Option<ReviewStatus>,
}

/// Persist a new pending submission.
///
/// The pending check here produces the friendly error; the partial unique
/// index on `(target_display_id) WHERE status = 0` is the guarantee when
/// two submitters race past the check.
pub async fn create(
    conn: &mut SqliteConnection,
    submitter_id: i64,
    kind: SubmissionKind,
    target_display_id: &str,
    payload: &Value,
    now: DateTime<Utc>,
) -> Result<Submission> {
    if pending_for_target(&mut *conn, target_display_id).await? {
        return Err(Error::Conflict(format!(
            "a pending submission already targets {}",
            target_display_id
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO song_publishing_review
            (submitter_id, target_display_id, kind, payload, status,
             review_comment, submit_time, update_time, review_time)
        VALUES (?, ?, ?, ?, 0, NULL, ?, ?, NULL)
        "#,
    )
    .bind(submitter_id)
    .bind(target_display_id)
    .bind(kind.as_i64())
    .bind(payload)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::Conflict(format!(
                "a pending submission already targets {}",
                target_display_id
            ))
        } else {
            Error::from(e)
        }
    })?;

    let id = result.last_insert_rowid();
    get(conn, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("submission {} vanished after insert", id)))
}

/// Load one submission by id
pub async fn get(conn: &mut SqliteConnection, id: i64) -> Result<Option<Submission>> {
    let row = sqlx::query("SELECT * FROM song_publishing_review WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    match row {
        Some(row) => Ok(Some(row_to_submission(&row)?)),
        None => Ok(None),
    }
}

/// Whether a pending submission already targets the display id
pub async fn pending_for_target(conn: &mut SqliteConnection, display_id: &str) -> Result<bool> {
    let row = sqlx::query(
        "SELECT 1 FROM song_publishing_review WHERE target_display_id = ? AND status = 0",
    )
    .bind(display_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.is_some())
}

/// List submissions, newest first (`submit_time` DESC, ties by `id` DESC)
pub async fn list(
    conn: &mut SqliteConnection,
    filter: SubmissionFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Submission>> {
    let mut sql = String::from("SELECT * FROM song_publishing_review WHERE 1 = 1");
    if filter.submitter_id.is_some() {
        sql.push_str(" AND submitter_id = ?");
    }
    if filter.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY submit_time DESC, id DESC LIMIT ? OFFSET ?");

    let mut query = sqlx::query(&sql);
    if let Some(submitter_id) = filter.submitter_id {
        query = query.bind(submitter_id);
    }
    if let Some(status) = filter.status {
        query = query.bind(status.as_i64());
    }
    let rows = query.bind(limit).bind(offset).fetch_all(conn).await?;

    rows.iter().map(row_to_submission).collect()
}

/// Count submissions matching a filter
pub async fn count(conn: &mut SqliteConnection, filter: SubmissionFilter) -> Result<i64> {
    let mut sql = String::from("SELECT COUNT(*) AS n FROM song_publishing_review WHERE 1 = 1");
    if filter.submitter_id.is_some() {
        sql.push_str(" AND submitter_id = ?");
    }
    if filter.status.is_some() {
        sql.push_str(" AND status = ?");
    }

    let mut query = sqlx::query(&sql);
    if let Some(submitter_id) = filter.submitter_id {
        query = query.bind(submitter_id);
    }
    if let Some(status) = filter.status {
        query = query.bind(status.as_i64());
    }
    let row = query.fetch_one(conn).await?;
    Ok(row.try_get("n")?)
}

/// Move a pending submission to a terminal state.
///
/// The UPDATE is guarded on `status = 0` so two concurrent decisions can
/// never both commit; the loser sees InvalidState (or NotFound if the id
/// never existed).
pub async fn transition(
    conn: &mut SqliteConnection,
    id: i64,
    decision: Decision,
    comment: Option<&str>,
    reviewer_clock: DateTime<Utc>,
) -> Result<Submission> {
    let result = sqlx::query(
        r#"
        UPDATE song_publishing_review
        SET status = ?, review_comment = ?, review_time = ?, update_time = ?
        WHERE id = ? AND status = 0
        "#,
    )
    .bind(decision.status().as_i64())
    .bind(comment)
    .bind(reviewer_clock)
    .bind(reviewer_clock)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return match get(conn, id).await? {
            None => Err(Error::NotFound(format!("submission {} not found", id))),
            Some(s) => Err(Error::InvalidState(format!(
                "submission {} is already {:?}",
                id, s.status
            ))),
        };
    }

    get(conn, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("submission {} vanished after update", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use serde_json::json;

    async fn insert_pending(
        conn: &mut SqliteConnection,
        submitter: i64,
        target: &str,
    ) -> Submission {
        create(
            conn,
            submitter,
            SubmissionKind::Create,
            target,
            &json!({"kind": "create", "title": "t"}),
            Utc::now(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_persists_pending_row() {
        let pool = memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let s = insert_pending(&mut conn, 7, "MX-ABCD-001").await;
        assert_eq!(s.status, ReviewStatus::Pending);
        assert_eq!(s.kind, SubmissionKind::Create);
        assert_eq!(s.submit_time, s.update_time);
        assert!(s.review_time.is_none());
        assert!(pending_for_target(&mut conn, "MX-ABCD-001").await.unwrap());
    }

    #[tokio::test]
    async fn second_pending_for_same_target_conflicts() {
        let pool = memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        insert_pending(&mut conn, 7, "MX-ABCD-001").await;
        let err = create(
            &mut conn,
            8,
            SubmissionKind::Modify,
            "MX-ABCD-001",
            &json!({"kind": "modify"}),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn rejected_target_can_be_resubmitted() {
        let pool = memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let s = insert_pending(&mut conn, 7, "MX-ABCD-001").await;
        transition(&mut conn, s.id, Decision::Rejected, Some("needs work"), Utc::now())
            .await
            .unwrap();

        // Rejected is terminal and no longer blocks the target
        let again = insert_pending(&mut conn, 7, "MX-ABCD-001").await;
        assert_eq!(again.status, ReviewStatus::Pending);
    }

    #[tokio::test]
    async fn transition_is_single_shot() {
        let pool = memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let s = insert_pending(&mut conn, 7, "MX-ABCD-001").await;
        let approved = transition(&mut conn, s.id, Decision::Approved, None, Utc::now())
            .await
            .unwrap();
        assert_eq!(approved.status, ReviewStatus::Approved);
        assert!(approved.review_time.is_some());
        assert_eq!(approved.review_time, Some(approved.update_time));

        let err = transition(&mut conn, s.id, Decision::Rejected, Some("late"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn transition_unknown_id_is_not_found() {
        let pool = memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let err = transition(&mut conn, 999, Decision::Approved, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn list_orders_newest_first_with_id_tiebreak() {
        let pool = memory_pool().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let now = Utc::now();
        for (i, target) in ["MX-AAAA-001", "MX-AAAA-002", "MX-AAAA-003"].iter().enumerate() {
            create(
                &mut conn,
                7,
                SubmissionKind::Create,
                target,
                &json!({"kind": "create"}),
                now + chrono::Duration::seconds(i as i64),
            )
            .await
            .unwrap();
        }
        // Same timestamp as the last row: id breaks the tie
        create(
            &mut conn,
            7,
            SubmissionKind::Create,
            "MX-AAAA-004",
            &json!({"kind": "create"}),
            now + chrono::Duration::seconds(2),
        )
        .await
        .unwrap();

        let listed = list(&mut conn, SubmissionFilter::default(), 10, 0).await.unwrap();
        let targets: Vec<_> = listed.iter().map(|s| s.target_display_id.as_str()).collect();
        assert_eq!(
            targets,
            vec!["MX-AAAA-004", "MX-AAAA-003", "MX-AAAA-002", "MX-AAAA-001"]
        );

        let only_pending = list(
            &mut conn,
            SubmissionFilter { submitter_id: Some(7), status: Some(ReviewStatus::Pending) },
            2,
            0,
        )
        .await
        .unwrap();
        assert_eq!(only_pending.len(), 2);
        assert_eq!(count(&mut conn, SubmissionFilter::default()).await.unwrap(), 4);
    }
}
