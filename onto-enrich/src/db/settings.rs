//! Settings database operations
//!
//! Key-value accessors over the `settings` table.

use onto_common::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Settings key holding the Knowledge Graph API key
pub const KNOWLEDGE_GRAPH_API_KEY: &str = "knowledge_graph_api_key";

/// Get Knowledge Graph API key from database
///
/// **Returns:** Some(key) if exists, None if not set
pub async fn get_knowledge_graph_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, KNOWLEDGE_GRAPH_API_KEY).await
}

/// Set Knowledge Graph API key in database
pub async fn set_knowledge_graph_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, KNOWLEDGE_GRAPH_API_KEY, key).await
}

/// Generic setting getter
pub async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting '{}' failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (upsert)
pub async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}
