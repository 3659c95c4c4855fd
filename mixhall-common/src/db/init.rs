//! Database initialization
//!
//! Opens (or creates) the SQLite database and applies the idempotent
//! schema migrations. Safe to call on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Initialize database connection and create tables if needed.
///
/// Pragmas are set through the connect options so every pooled
/// connection gets them: referential integrity, WAL for concurrent
/// readers, and a busy timeout so lock waits fail with SQLITE_BUSY
/// instead of blocking forever (surfaced to callers as a retryable
/// Contention).
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Run schema migrations (idempotent - safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_songs_table(pool).await?;
    create_song_production_crew_table(pool).await?;
    create_song_external_links_table(pool).await?;
    create_song_origin_info_table(pool).await?;
    create_song_tags_table(pool).await?;
    create_song_publishing_review_table(pool).await?;
    Ok(())
}

async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Canonical content store. Rows are created and mutated only by the
/// approval step of the review workflow; `play_count` and `like_count`
/// are the exception, owned by independent collaborators.
async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            display_id TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            subtitle TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            artist TEXT NOT NULL,
            lyrics TEXT NOT NULL,
            audio_url TEXT NOT NULL,
            cover_url TEXT NOT NULL,
            duration_seconds INTEGER NOT NULL,
            uploader_id INTEGER NOT NULL,
            creation_kind INTEGER NOT NULL DEFAULT 0,
            explicit INTEGER NOT NULL DEFAULT 0,
            is_private INTEGER NOT NULL DEFAULT 0,
            play_count INTEGER NOT NULL DEFAULT 0,
            like_count INTEGER NOT NULL DEFAULT 0,
            release_time TEXT NOT NULL,
            create_time TEXT NOT NULL,
            update_time TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_uploader ON songs(uploader_id)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_song_production_crew_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_production_crew (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            song_id INTEGER NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
            role TEXT NOT NULL,
            user_id INTEGER,
            person_name TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_crew_song ON song_production_crew(song_id)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_song_external_links_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_external_links (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            song_id INTEGER NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
            platform TEXT NOT NULL,
            url TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_links_song ON song_external_links(song_id)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_song_origin_info_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_origin_info (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            song_id INTEGER NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
            origin_kind INTEGER NOT NULL,
            origin_display_id TEXT,
            origin_title TEXT,
            origin_artist TEXT,
            origin_url TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_origin_song ON song_origin_info(song_id)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn create_song_tags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_tags (
            song_id INTEGER NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
            tag TEXT NOT NULL,
            PRIMARY KEY (song_id, tag)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Review requests: one row per submission, holding the proposed song
/// snapshot as JSON plus the lifecycle columns.
///
/// The partial unique index is the hard guarantee behind the
/// one-pending-submission-per-target invariant; the application check in
/// `submissions::create` only produces the friendlier error first.
async fn create_song_publishing_review_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS song_publishing_review (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            submitter_id INTEGER NOT NULL,
            target_display_id TEXT NOT NULL,
            kind INTEGER NOT NULL,
            payload TEXT NOT NULL,
            status INTEGER NOT NULL DEFAULT 0,
            review_comment TEXT,
            submit_time TEXT NOT NULL,
            update_time TEXT NOT NULL,
            review_time TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_review_pending_target
         ON song_publishing_review(target_display_id) WHERE status = 0",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_review_submitter
         ON song_publishing_review(submitter_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_review_status_time
         ON song_publishing_review(status, submit_time)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// In-memory pool with full schema, for tests
pub async fn memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}
