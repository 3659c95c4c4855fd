//! Settings table access

use crate::Result;
use sqlx::{Row, SqlitePool};

const SHARED_SECRET_KEY: &str = "api_shared_secret";

/// Load the shared secret used to gate reviewer endpoints.
///
/// The special value 0 (or a missing row) disables auth checking.
pub async fn load_shared_secret(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
        .bind(SHARED_SECRET_KEY)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let value: String = row.try_get("value")?;
            Ok(value.parse::<i64>().unwrap_or(0))
        }
        None => Ok(0),
    }
}

/// Store the shared secret (used by provisioning and tests)
pub async fn store_shared_secret(pool: &SqlitePool, secret: i64) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(SHARED_SECRET_KEY)
    .bind(secret.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    #[tokio::test]
    async fn missing_secret_defaults_to_disabled() {
        let pool = memory_pool().await.unwrap();
        assert_eq!(load_shared_secret(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn stored_secret_round_trips() {
        let pool = memory_pool().await.unwrap();
        store_shared_secret(&pool, 424242).await.unwrap();
        assert_eq!(load_shared_secret(&pool).await.unwrap(), 424242);
    }
}
