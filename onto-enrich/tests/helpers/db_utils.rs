//! Database Test Utilities

use anyhow::Result;
use onto_enrich::db::{init_database_pool, SqliteEntityCache};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Create a file-backed test database with tables initialized
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_onto.db");

    let pool = init_database_pool(&db_path).await?;

    Ok((temp_dir, pool))
}

/// File-backed SQLite entity cache
pub async fn create_test_cache() -> Result<(TempDir, SqliteEntityCache)> {
    let (temp_dir, pool) = create_test_db().await?;
    Ok((temp_dir, SqliteEntityCache::new(pool)))
}
