//! # Settings Repository
//!
//! Key/value integers. The freshness mark is stored here under
//! [`LAST_FETCH_KEY`].

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Key under which the last successful fetch time (epoch millis) is kept.
pub const LAST_FETCH_KEY: &str = "DbTimestampKey";

/// Repository for settings database operations.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Reads a long, falling back to `default` when the key is absent or null.
    pub async fn get_long(&self, key: &str, default: i64) -> DbResult<i64> {
        let value: Option<Option<i64>> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value.flatten().unwrap_or(default))
    }

    /// Writes a long, replacing any previous value.
    pub async fn put_long(&self, key: &str, value: i64) -> DbResult<()> {
        debug!(key, value, "Storing setting");

        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_missing_key_returns_default() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(db.settings().get_long(LAST_FETCH_KEY, 0).await.unwrap(), 0);
        assert_eq!(db.settings().get_long("other", -1).await.unwrap(), -1);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings();

        settings.put_long(LAST_FETCH_KEY, 1_000).await.unwrap();
        settings.put_long(LAST_FETCH_KEY, 2_000).await.unwrap();

        assert_eq!(settings.get_long(LAST_FETCH_KEY, 0).await.unwrap(), 2_000);
    }
}
