//! Database access for bb-coach
//!
//! Everything bb-coach persists lives in the key-value `settings` table.

pub mod settings;

use bb_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (or create) the database in the root folder
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    let pool = bb_common::db::init_database(db_path).await?;
    tracing::info!("Database tables initialized (settings)");
    Ok(pool)
}
