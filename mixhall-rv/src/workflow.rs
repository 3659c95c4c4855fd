//! Review workflow engine
//!
//! The state machine over submissions: Pending is the only initial state,
//! Approved and Rejected are terminal. Submit validates before anything is
//! persisted; Approve applies the stored snapshot to the content store in
//! one transaction; Reject is a single-table transition.

use chrono::{DateTime, Utc};
use mixhall_common::db::songs::{self, Song};
use mixhall_common::db::submissions::{self, Decision, ReviewStatus, Submission, SubmissionKind};
use mixhall_common::payload::{SongDraft, SubmissionPayload, MAX_COMMENT_CHARS};
use mixhall_common::{display_id, Error, Result};
use sqlx::SqlitePool;
use tracing::info;

/// Input to [`submit`]
#[derive(Debug)]
pub struct SubmitRequest {
    pub submitter_id: i64,
    pub kind: SubmissionKind,
    /// For Modify this names the published song. For Create it may carry a
    /// pre-reserved identity; when absent the engine reserves a fresh one.
    pub target_display_id: Option<String>,
    pub draft: SongDraft,
}

/// Validate and persist a new review request.
///
/// Only a Pending submission blocks a target; a prior Rejected decision
/// does not, so resubmission after rejection is an ordinary submit.
pub async fn submit(db: &SqlitePool, req: SubmitRequest) -> Result<Submission> {
    req.draft.validate()?;

    let mut tx = db.begin().await?;

    let target = match req.kind {
        SubmissionKind::Create => match req.target_display_id {
            Some(target) => {
                if !display_id::is_valid(&target) {
                    return Err(Error::InvalidPayload(format!(
                        "malformed display id: {}",
                        target
                    )));
                }
                if songs::display_id_taken(&mut tx, &target).await? {
                    return Err(Error::InvalidReference(format!(
                        "display id {} is already published",
                        target
                    )));
                }
                target
            }
            None => reserve_display_id(&mut tx).await?,
        },
        SubmissionKind::Modify => {
            let target = req.target_display_id.ok_or_else(|| {
                Error::InvalidPayload("modify submission requires a target display id".into())
            })?;
            let song = songs::get_by_display_id(&mut tx, &target).await?;
            match song {
                Some(song) if !song.is_private => {}
                // A private song is invisible to the review pipeline
                _ => return Err(Error::NotFound(format!("song {} not found", target))),
            }
            target
        }
    };

    let payload = match req.kind {
        SubmissionKind::Create => SubmissionPayload::Create(req.draft),
        SubmissionKind::Modify => SubmissionPayload::Modify(req.draft),
    };
    let payload = serde_json::to_value(&payload)
        .map_err(|e| Error::Internal(format!("payload encode failed: {}", e)))?;

    let now = Utc::now();
    let submission =
        submissions::create(&mut tx, req.submitter_id, req.kind, &target, &payload, now).await?;
    tx.commit().await?;

    info!(
        "Submission {} created: {:?} targeting {} by user {}",
        submission.id, submission.kind, submission.target_display_id, submission.submitter_id
    );
    Ok(submission)
}

/// Approve a pending submission and apply its snapshot to the catalog.
///
/// Everything happens in one transaction: the re-read of the submission,
/// the identity/target re-checks, the catalog writes and the status
/// transition. Any failure rolls the whole transaction back and the
/// submission stays Pending.
pub async fn approve(db: &SqlitePool, id: i64, comment: Option<String>) -> Result<Submission> {
    if let Some(ref c) = comment {
        check_comment_length(c)?;
    }

    let mut tx = db.begin().await?;

    let submission = submissions::get(&mut tx, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("submission {} not found", id)))?;
    if submission.status != ReviewStatus::Pending {
        return Err(Error::InvalidState(format!(
            "submission {} is already {:?}",
            id, submission.status
        )));
    }

    let draft = decode_draft(&submission)?;
    let now = Utc::now();

    match submission.kind {
        SubmissionKind::Create => {
            // Close the create/create race: a different approved Create may
            // have claimed the identity since submit time.
            if songs::display_id_taken(&mut tx, &submission.target_display_id).await? {
                return Err(Error::IdentityTaken(format!(
                    "display id {} was published since submission",
                    submission.target_display_id
                )));
            }

            let song = song_from_draft(&submission, &draft, now);
            let song_id = songs::insert_song(&mut tx, &song).await?;
            apply_child_rows(&mut tx, song_id, &draft).await?;
            info!(
                "Submission {} approved: created song {} ({})",
                id, submission.target_display_id, song_id
            );
        }
        SubmissionKind::Modify => {
            let orig = songs::get_by_display_id(&mut tx, &submission.target_display_id).await?;
            let orig = match orig {
                Some(song) if !song.is_private => song,
                // The target went private or away between submit and review;
                // the submission is invalidated at approval time.
                _ => {
                    return Err(Error::NotFound(format!(
                        "song {} no longer published",
                        submission.target_display_id
                    )))
                }
            };

            let mut song = orig.clone();
            song.title = draft.title.clone();
            song.subtitle = draft.subtitle.clone();
            song.description = draft.description.clone();
            song.artist = draft.artist();
            song.lyrics = draft.lyrics.clone();
            song.audio_url = draft.audio_url.clone();
            song.cover_url = draft.cover_url.clone();
            song.duration_seconds = draft.duration_seconds;
            song.creation_kind = draft.creation;
            song.explicit = draft.explicit;
            song.update_time = now;

            songs::update_song(&mut tx, &song).await?;
            apply_child_rows(&mut tx, orig.id, &draft).await?;
            info!(
                "Submission {} approved: updated song {} ({})",
                id, submission.target_display_id, orig.id
            );
        }
    }

    let submission =
        submissions::transition(&mut tx, id, Decision::Approved, comment.as_deref(), now).await?;
    tx.commit().await?;

    Ok(submission)
}

/// Reject a pending submission. Requires a non-blank comment and never
/// touches the content store.
pub async fn reject(db: &SqlitePool, id: i64, comment: &str) -> Result<Submission> {
    if comment.trim().is_empty() {
        return Err(Error::MissingComment);
    }
    check_comment_length(comment)?;

    let mut conn = db.acquire().await?;
    let submission =
        submissions::transition(&mut conn, id, Decision::Rejected, Some(comment), Utc::now())
            .await?;

    info!(
        "Submission {} rejected by reviewer (target {})",
        id, submission.target_display_id
    );
    Ok(submission)
}

fn check_comment_length(comment: &str) -> Result<()> {
    if comment.chars().count() > MAX_COMMENT_CHARS {
        return Err(Error::InvalidPayload(format!(
            "comment exceeds {} characters",
            MAX_COMMENT_CHARS
        )));
    }
    Ok(())
}

/// Decode the stored snapshot, checking the tag against the row's kind.
/// A mismatch or decode failure means the stored row is corrupt.
fn decode_draft(submission: &Submission) -> Result<SongDraft> {
    let payload: SubmissionPayload = serde_json::from_value(submission.payload.clone())
        .map_err(|e| {
            Error::Internal(format!(
                "submission {} payload decode failed: {}",
                submission.id, e
            ))
        })?;
    match (&payload, submission.kind) {
        (SubmissionPayload::Create(_), SubmissionKind::Create)
        | (SubmissionPayload::Modify(_), SubmissionKind::Modify) => {}
        _ => {
            return Err(Error::Internal(format!(
                "submission {} payload tag does not match its kind",
                submission.id
            )))
        }
    }
    Ok(payload.draft().clone())
}

fn song_from_draft(submission: &Submission, draft: &SongDraft, now: DateTime<Utc>) -> Song {
    Song {
        id: 0,
        display_id: submission.target_display_id.clone(),
        title: draft.title.clone(),
        subtitle: draft.subtitle.clone(),
        description: draft.description.clone(),
        artist: draft.artist(),
        lyrics: draft.lyrics.clone(),
        audio_url: draft.audio_url.clone(),
        cover_url: draft.cover_url.clone(),
        duration_seconds: draft.duration_seconds,
        uploader_id: submission.submitter_id,
        creation_kind: draft.creation,
        explicit: draft.explicit,
        is_private: false,
        play_count: 0,
        like_count: 0,
        release_time: now,
        create_time: now,
        update_time: now,
    }
}

async fn apply_child_rows(
    tx: &mut sqlx::SqliteConnection,
    song_id: i64,
    draft: &SongDraft,
) -> Result<()> {
    songs::replace_production_crew(tx, song_id, &draft.crew).await?;
    songs::replace_external_links(tx, song_id, &draft.links).await?;
    songs::replace_origin_info(tx, song_id, draft.origin.as_ref()).await?;
    songs::replace_tags(tx, song_id, &draft.tags).await?;
    Ok(())
}

/// Reserve a display id not present in the catalog and not targeted by a
/// pending submission.
async fn reserve_display_id(tx: &mut sqlx::SqliteConnection) -> Result<String> {
    loop {
        let candidate = display_id::generate();
        if songs::display_id_taken(&mut *tx, &candidate).await? {
            continue;
        }
        if submissions::pending_for_target(&mut *tx, &candidate).await? {
            continue;
        }
        return Ok(candidate);
    }
}
