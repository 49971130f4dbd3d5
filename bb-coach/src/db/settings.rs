//! Settings database operations
//!
//! Get/set accessors for the key-value `settings` table.

use bb_common::{Error, Result};
use sqlx::{Pool, Sqlite};

#[cfg(test)]
use sqlx::SqlitePool;

/// Vision API key
pub const VISION_API_KEY: &str = "vision_api_key";
/// Free-text guidance forwarded to the aggregate scoring call
pub const SCORING_CONTEXT: &str = "scoring_context";
/// JSON array of tournament games
pub const TOURNAMENT_GAMES: &str = "tournament_games";
/// JSON array of bowling balls
pub const EQUIPMENT_BALLS: &str = "equipment_balls";

/// Get vision API key from database
///
/// **Returns:** Some(key) if exists, None if not set
pub async fn get_vision_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, VISION_API_KEY).await
}

/// Set vision API key in database
pub async fn set_vision_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, VISION_API_KEY, key).await
}

/// Get scoring context, None if never set
pub async fn get_scoring_context(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, SCORING_CONTEXT).await
}

/// Set scoring context
pub async fn set_scoring_context(db: &Pool<Sqlite>, text: String) -> Result<()> {
    set_setting(db, SCORING_CONTEXT, text).await
}

/// Raw stored text for `key` (NULL reads as None)
pub async fn get_raw_setting(db: &Pool<Sqlite>, key: &str) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    Ok(row.and_then(|(value,)| value))
}

/// Store raw text under `key`
pub async fn set_raw_setting(db: &Pool<Sqlite>, key: &str, value: &str) -> Result<()> {
    set_setting(db, key, value).await
}

/// Remove `key` entirely
pub async fn delete_setting(db: &Pool<Sqlite>, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(db)
        .await
        .map_err(Error::Database)?;

    Ok(())
}

/// Generic setting getter (internal)
async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_raw_setting(db, key).await? {
        Some(value) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting failed: {}", e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (internal)
async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Setup in-memory test database with settings table
    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        bb_common::db::create_settings_table(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_get_vision_api_key_exists() {
        let pool = setup_test_db().await;

        sqlx::query("INSERT INTO settings (key, value) VALUES ('vision_api_key', 'test_key_123')")
            .execute(&pool)
            .await
            .unwrap();

        let result = get_vision_api_key(&pool).await.unwrap();
        assert_eq!(result, Some("test_key_123".to_string()));
    }

    #[tokio::test]
    async fn test_get_vision_api_key_not_exists() {
        let pool = setup_test_db().await;

        let result = get_vision_api_key(&pool).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_null_value_reads_as_absent() {
        let pool = setup_test_db().await;

        sqlx::query("INSERT INTO settings (key, value) VALUES ('scoring_context', NULL)")
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(get_scoring_context(&pool).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_vision_api_key_update() {
        let pool = setup_test_db().await;

        set_vision_api_key(&pool, "old_key".to_string()).await.unwrap();
        set_vision_api_key(&pool, "new_key".to_string()).await.unwrap();

        let result = get_vision_api_key(&pool).await.unwrap();
        assert_eq!(result, Some("new_key".to_string()));

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE key = 'vision_api_key'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1, "Should have exactly one entry after update");
    }

    #[tokio::test]
    async fn test_delete_setting_removes_row() {
        let pool = setup_test_db().await;

        set_raw_setting(&pool, TOURNAMENT_GAMES, "[]").await.unwrap();
        delete_setting(&pool, TOURNAMENT_GAMES).await.unwrap();

        assert_eq!(get_raw_setting(&pool, TOURNAMENT_GAMES).await.unwrap(), None);
    }
}
