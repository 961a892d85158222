//! Database access for onto-enrich
//!
//! One SQLite file under the root folder holds the settings table and the
//! enriched-entity cache.

pub mod entity_cache;
pub mod memory_cache;
pub mod settings;

pub use entity_cache::{CacheRecord, CacheStats, EntityCache, SqliteEntityCache};
pub use memory_cache::MemoryEntityCache;

use onto_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Creates the parent directory and the database file when missing.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the settings and cache tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
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

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS enriched_entity_cache (
            entity_name_normalized TEXT PRIMARY KEY,
            entity_name TEXT NOT NULL,
            entity_data TEXT NOT NULL,
            confidence INTEGER NOT NULL,
            sources INTEGER NOT NULL,
            hit_count INTEGER NOT NULL DEFAULT 0,
            cached_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_enriched_entity_cache_expires_at
         ON enriched_entity_cache (expires_at)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (settings, enriched_entity_cache)");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_file_and_tables() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("nested").join("onto.db");

        let pool = init_database_pool(&db_path).await.unwrap();
        assert!(db_path.exists());

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();

        assert!(names.contains(&"settings"));
        assert!(names.contains(&"enriched_entity_cache"));
    }

    #[tokio::test]
    async fn test_init_tables_is_idempotent() {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        init_tables(&pool).await.unwrap();
        init_tables(&pool).await.unwrap();
    }
}
