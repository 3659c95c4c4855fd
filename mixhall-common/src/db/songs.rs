//! Content store: canonical published songs and their child rows
//!
//! Rows here are written only inside the approval transaction of the
//! review workflow, except for the counter columns at the bottom of this
//! file which independent collaborators update in isolation.

use crate::payload::{CreationKind, CrewMember, ExternalLink, OriginRef};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

/// Canonical published song
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub display_id: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    /// Derived from the production crew, never accepted as direct input
    pub artist: String,
    pub lyrics: String,
    pub audio_url: String,
    pub cover_url: String,
    pub duration_seconds: i64,
    pub uploader_id: i64,
    pub creation_kind: CreationKind,
    pub explicit: bool,
    pub is_private: bool,
    pub play_count: i64,
    pub like_count: i64,
    pub release_time: DateTime<Utc>,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

fn row_to_song(row: &SqliteRow) -> Result<Song> {
    Ok(Song {
        id: row.try_get("id")?,
        display_id: row.try_get("display_id")?,
        title: row.try_get("title")?,
        subtitle: row.try_get("subtitle")?,
        description: row.try_get("description")?,
        artist: row.try_get("artist")?,
        lyrics: row.try_get("lyrics")?,
        audio_url: row.try_get("audio_url")?,
        cover_url: row.try_get("cover_url")?,
        duration_seconds: row.try_get("duration_seconds")?,
        uploader_id: row.try_get("uploader_id")?,
        creation_kind: CreationKind::from_i64(row.try_get("creation_kind")?)?,
        explicit: row.try_get("explicit")?,
        is_private: row.try_get("is_private")?,
        play_count: row.try_get("play_count")?,
        like_count: row.try_get("like_count")?,
        release_time: row.try_get("release_time")?,
        create_time: row.try_get("create_time")?,
        update_time: row.try_get("update_time")?,
    })
}

/// Load a song by its public display id
pub async fn get_by_display_id(
    conn: &mut SqliteConnection,
    display_id: &str,
) -> Result<Option<Song>> {
    let row = sqlx::query("SELECT * FROM songs WHERE display_id = ?")
        .bind(display_id)
        .fetch_optional(conn)
        .await?;

    match row {
        Some(row) => Ok(Some(row_to_song(&row)?)),
        None => Ok(None),
    }
}

/// Whether a display id is already occupied in the catalog
pub async fn display_id_taken(conn: &mut SqliteConnection, display_id: &str) -> Result<bool> {
    let row = sqlx::query("SELECT 1 FROM songs WHERE display_id = ?")
        .bind(display_id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

/// Insert a new song row, returning its id
pub async fn insert_song(conn: &mut SqliteConnection, song: &Song) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO songs (
            display_id, title, subtitle, description, artist, lyrics,
            audio_url, cover_url, duration_seconds, uploader_id,
            creation_kind, explicit, is_private, play_count, like_count,
            release_time, create_time, update_time
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&song.display_id)
    .bind(&song.title)
    .bind(&song.subtitle)
    .bind(&song.description)
    .bind(&song.artist)
    .bind(&song.lyrics)
    .bind(&song.audio_url)
    .bind(&song.cover_url)
    .bind(song.duration_seconds)
    .bind(song.uploader_id)
    .bind(song.creation_kind.as_i64())
    .bind(song.explicit)
    .bind(song.is_private)
    .bind(song.play_count)
    .bind(song.like_count)
    .bind(song.release_time)
    .bind(song.create_time)
    .bind(song.update_time)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Update the submission-sourced columns of an existing song.
///
/// Counters, visibility, uploader and creation time are deliberately not
/// written here; those columns have other owners.
pub async fn update_song(conn: &mut SqliteConnection, song: &Song) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE songs SET
            title = ?,
            subtitle = ?,
            description = ?,
            artist = ?,
            lyrics = ?,
            audio_url = ?,
            cover_url = ?,
            duration_seconds = ?,
            creation_kind = ?,
            explicit = ?,
            update_time = ?
        WHERE id = ?
        "#,
    )
    .bind(&song.title)
    .bind(&song.subtitle)
    .bind(&song.description)
    .bind(&song.artist)
    .bind(&song.lyrics)
    .bind(&song.audio_url)
    .bind(&song.cover_url)
    .bind(song.duration_seconds)
    .bind(song.creation_kind.as_i64())
    .bind(song.explicit)
    .bind(song.update_time)
    .bind(song.id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Replace the production crew rows for a song (delete-then-insert)
pub async fn replace_production_crew(
    conn: &mut SqliteConnection,
    song_id: i64,
    crew: &[CrewMember],
) -> Result<()> {
    sqlx::query("DELETE FROM song_production_crew WHERE song_id = ?")
        .bind(song_id)
        .execute(&mut *conn)
        .await?;
    for member in crew {
        sqlx::query(
            "INSERT INTO song_production_crew (song_id, role, user_id, person_name)
             VALUES (?, ?, ?, ?)",
        )
        .bind(song_id)
        .bind(&member.role)
        .bind(member.user_id)
        .bind(&member.name)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Replace the external link rows for a song (delete-then-insert)
pub async fn replace_external_links(
    conn: &mut SqliteConnection,
    song_id: i64,
    links: &[ExternalLink],
) -> Result<()> {
    sqlx::query("DELETE FROM song_external_links WHERE song_id = ?")
        .bind(song_id)
        .execute(&mut *conn)
        .await?;
    for link in links {
        sqlx::query("INSERT INTO song_external_links (song_id, platform, url) VALUES (?, ?, ?)")
            .bind(song_id)
            .bind(&link.platform)
            .bind(&link.url)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Replace the origin record for a song (delete-then-insert)
pub async fn replace_origin_info(
    conn: &mut SqliteConnection,
    song_id: i64,
    origin: Option<&OriginRef>,
) -> Result<()> {
    sqlx::query("DELETE FROM song_origin_info WHERE song_id = ?")
        .bind(song_id)
        .execute(&mut *conn)
        .await?;
    if let Some(origin) = origin {
        sqlx::query(
            "INSERT INTO song_origin_info
                 (song_id, origin_kind, origin_display_id, origin_title, origin_artist, origin_url)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(song_id)
        .bind(origin.origin_kind.as_i64())
        .bind(&origin.display_id)
        .bind(&origin.title)
        .bind(&origin.artist)
        .bind(&origin.url)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Replace the tag rows for a song (delete-then-insert)
pub async fn replace_tags(conn: &mut SqliteConnection, song_id: i64, tags: &[String]) -> Result<()> {
    sqlx::query("DELETE FROM song_tags WHERE song_id = ?")
        .bind(song_id)
        .execute(&mut *conn)
        .await?;
    for tag in tags {
        sqlx::query("INSERT OR IGNORE INTO song_tags (song_id, tag) VALUES (?, ?)")
            .bind(song_id)
            .bind(tag)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Load crew rows in insertion order
pub async fn list_production_crew(
    conn: &mut SqliteConnection,
    song_id: i64,
) -> Result<Vec<CrewMember>> {
    let rows = sqlx::query(
        "SELECT role, user_id, person_name FROM song_production_crew
         WHERE song_id = ? ORDER BY id",
    )
    .bind(song_id)
    .fetch_all(conn)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(CrewMember {
                role: row.try_get("role")?,
                user_id: row.try_get("user_id")?,
                name: row.try_get("person_name")?,
            })
        })
        .collect()
}

/// Load external link rows in insertion order
pub async fn list_external_links(
    conn: &mut SqliteConnection,
    song_id: i64,
) -> Result<Vec<ExternalLink>> {
    let rows = sqlx::query(
        "SELECT platform, url FROM song_external_links WHERE song_id = ? ORDER BY id",
    )
    .bind(song_id)
    .fetch_all(conn)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(ExternalLink {
                platform: row.try_get("platform")?,
                url: row.try_get("url")?,
            })
        })
        .collect()
}

/// Load the origin record, if any
pub async fn get_origin_info(
    conn: &mut SqliteConnection,
    song_id: i64,
) -> Result<Option<OriginRef>> {
    let row = sqlx::query(
        "SELECT origin_kind, origin_display_id, origin_title, origin_artist, origin_url
         FROM song_origin_info WHERE song_id = ?",
    )
    .bind(song_id)
    .fetch_optional(conn)
    .await?;

    match row {
        Some(row) => Ok(Some(OriginRef {
            origin_kind: CreationKind::from_i64(row.try_get("origin_kind")?)?,
            display_id: row.try_get("origin_display_id")?,
            title: row.try_get("origin_title")?,
            artist: row.try_get("origin_artist")?,
            url: row.try_get("origin_url")?,
        })),
        None => Ok(None),
    }
}

/// Load tags sorted alphabetically
pub async fn list_tags(conn: &mut SqliteConnection, song_id: i64) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT tag FROM song_tags WHERE song_id = ? ORDER BY tag")
        .bind(song_id)
        .fetch_all(conn)
        .await?;
    rows.iter().map(|row| Ok(row.try_get("tag")?)).collect()
}

// Counter columns below are owned by the play/like collaborators. They
// commit independently and touch only their own column, so they never
// conflict with the approval transaction.

/// Record one play of a song
pub async fn record_play(conn: &mut SqliteConnection, song_id: i64) -> Result<()> {
    sqlx::query("UPDATE songs SET play_count = play_count + 1 WHERE id = ?")
        .bind(song_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Add one like to a song
pub async fn add_like(conn: &mut SqliteConnection, song_id: i64) -> Result<()> {
    sqlx::query("UPDATE songs SET like_count = like_count + 1 WHERE id = ?")
        .bind(song_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Remove one like from a song, never dropping below zero
pub async fn remove_like(conn: &mut SqliteConnection, song_id: i64) -> Result<()> {
    sqlx::query("UPDATE songs SET like_count = MAX(like_count - 1, 0) WHERE id = ?")
        .bind(song_id)
        .execute(conn)
        .await?;
    Ok(())
}
