//! Review queue service
//!
//! Read-only projection over the submission repository for reviewer
//! triage and submitter history. Pages are keyed on `(submit_time, id)`
//! so cursors stay stable while new submissions arrive.

use chrono::{DateTime, Utc};
use mixhall_common::db::submissions::{ReviewStatus, Submission, SubmissionKind};
use mixhall_common::payload::SubmissionPayload;
use mixhall_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};
use tracing::warn;

/// Hard page-size cap
pub const MAX_PAGE_SIZE: i64 = 50;

/// Opaque pagination cursor: the `(submit_time, id)` of the last row served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub submit_time: DateTime<Utc>,
    pub id: i64,
}

impl Cursor {
    pub fn encode(&self) -> String {
        format!("{}|{}", self.submit_time.to_rfc3339(), self.id)
    }

    pub fn decode(input: &str) -> Result<Self> {
        let (time, id) = input
            .split_once('|')
            .ok_or_else(|| Error::InvalidPayload("malformed cursor".into()))?;
        let submit_time = DateTime::parse_from_rfc3339(time)
            .map_err(|_| Error::InvalidPayload("malformed cursor timestamp".into()))?
            .with_timezone(&Utc);
        let id = id
            .parse::<i64>()
            .map_err(|_| Error::InvalidPayload("malformed cursor id".into()))?;
        Ok(Cursor { submit_time, id })
    }
}

/// Compact view of a submission for queue listings. The snapshot decode
/// may fail for historical rows; briefs degrade to placeholders rather
/// than failing the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionBrief {
    pub id: i64,
    pub submitter_id: i64,
    pub target_display_id: String,
    pub kind: SubmissionKind,
    pub status: ReviewStatus,
    pub title: String,
    pub artist: String,
    pub cover_url: String,
    pub submit_time: DateTime<Utc>,
    pub review_time: Option<DateTime<Utc>>,
    pub review_comment: Option<String>,
}

impl From<&Submission> for SubmissionBrief {
    fn from(s: &Submission) -> Self {
        let (title, artist, cover_url) =
            match serde_json::from_value::<SubmissionPayload>(s.payload.clone()) {
                Ok(payload) => {
                    let draft = payload.draft();
                    (draft.title.clone(), draft.artist(), draft.cover_url.clone())
                }
                Err(e) => {
                    warn!("Error decoding submission {} payload for brief: {}", s.id, e);
                    ("unknown".to_string(), "unknown".to_string(), String::new())
                }
            };
        SubmissionBrief {
            id: s.id,
            submitter_id: s.submitter_id,
            target_display_id: s.target_display_id.clone(),
            kind: s.kind,
            status: s.status,
            title,
            artist,
            cover_url,
            submit_time: s.submit_time,
            review_time: s.review_time,
            review_comment: s.review_comment.clone(),
        }
    }
}

/// One page of queue entries plus the cursor for the next page (None when
/// the page was short, i.e. the listing is exhausted)
#[derive(Debug, Serialize)]
pub struct QueuePage {
    pub entries: Vec<SubmissionBrief>,
    pub next_cursor: Option<String>,
}

fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_PAGE_SIZE)
}

fn row_to_brief(row: &SqliteRow) -> Result<(SubmissionBrief, Cursor)> {
    // Reuses the repository row shape; only the columns a brief needs
    let submission = Submission {
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
    };
    let cursor = Cursor {
        submit_time: submission.submit_time,
        id: submission.id,
    };
    Ok(((&submission).into(), cursor))
}

/// Pending submissions for reviewer triage, oldest first
pub async fn pending_for_reviewers(
    conn: &mut SqliteConnection,
    limit: i64,
    cursor: Option<Cursor>,
) -> Result<QueuePage> {
    let limit = clamp_limit(limit);
    let rows = match cursor {
        Some(c) => {
            sqlx::query(
                "SELECT * FROM song_publishing_review
                 WHERE status = 0 AND (submit_time > ? OR (submit_time = ? AND id > ?))
                 ORDER BY submit_time ASC, id ASC LIMIT ?",
            )
            .bind(c.submit_time)
            .bind(c.submit_time)
            .bind(c.id)
            .bind(limit)
            .fetch_all(conn)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT * FROM song_publishing_review
                 WHERE status = 0
                 ORDER BY submit_time ASC, id ASC LIMIT ?",
            )
            .bind(limit)
            .fetch_all(conn)
            .await?
        }
    };

    build_page(&rows, limit)
}

/// A submitter's own requests across all statuses, newest first
pub async fn history_for_submitter(
    conn: &mut SqliteConnection,
    submitter_id: i64,
    limit: i64,
    cursor: Option<Cursor>,
) -> Result<QueuePage> {
    let limit = clamp_limit(limit);
    let rows = match cursor {
        Some(c) => {
            sqlx::query(
                "SELECT * FROM song_publishing_review
                 WHERE submitter_id = ? AND (submit_time < ? OR (submit_time = ? AND id < ?))
                 ORDER BY submit_time DESC, id DESC LIMIT ?",
            )
            .bind(submitter_id)
            .bind(c.submit_time)
            .bind(c.submit_time)
            .bind(c.id)
            .bind(limit)
            .fetch_all(conn)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT * FROM song_publishing_review
                 WHERE submitter_id = ?
                 ORDER BY submit_time DESC, id DESC LIMIT ?",
            )
            .bind(submitter_id)
            .bind(limit)
            .fetch_all(conn)
            .await?
        }
    };

    build_page(&rows, limit)
}

fn build_page(rows: &[SqliteRow], limit: i64) -> Result<QueuePage> {
    let mut entries = Vec::with_capacity(rows.len());
    let mut last_cursor = None;
    for row in rows {
        let (brief, cursor) = row_to_brief(row)?;
        entries.push(brief);
        last_cursor = Some(cursor);
    }
    let next_cursor = if entries.len() as i64 == limit {
        last_cursor.map(|c| c.encode())
    } else {
        None
    };
    Ok(QueuePage { entries, next_cursor })
}
