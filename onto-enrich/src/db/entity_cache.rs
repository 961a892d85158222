//! Enriched entity cache
//!
//! Keyed by normalized entity name (trimmed, lowercased). Records expire a
//! fixed TTL after they were written; reads filter expired rows out rather
//! than deleting them, and a hit bumps the row's counter without extending
//! its expiry.
//!
//! The quality bar for writing is applied by the orchestrator, not here.

use crate::matcher;
use crate::types::{EnrichedEntity, KnowledgeGraphLink};
use crate::utils::db_retry::{retry_on_lock, DEFAULT_MAX_LOCK_WAIT_MS};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use onto_common::time::{format_timestamp, now};
use onto_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, warn};

/// Freshness window for cached records
pub const CACHE_TTL_DAYS: i64 = 7;

/// Minimum confidence for a record to be cached
pub const MIN_CONFIDENCE_FOR_CACHE: u8 = 80;

/// Minimum contributing sources for a record to be cached
pub const MIN_SOURCES_FOR_CACHE: u8 = 2;

/// Cache key for an entity name
pub fn normalize_key(name: &str) -> String {
    matcher::normalize(name)
}

/// Whether an enrichment result is good enough to replay from cache
pub fn meets_cache_quality_bar(entity: &EnrichedEntity) -> bool {
    entity.confidence >= MIN_CONFIDENCE_FOR_CACHE && entity.sources >= MIN_SOURCES_FOR_CACHE
}

/// Persisted enrichment snapshot
///
/// Everything in [`EnrichedEntity`] except `name` and `type`, which the
/// caller supplies when the record is read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    #[serde(default)]
    pub wikipedia_url: Option<String>,
    #[serde(default)]
    pub wikidata_url: Option<String>,
    #[serde(default)]
    pub wikidata_id: Option<String>,
    #[serde(default)]
    pub knowledge_graph: Option<KnowledgeGraphLink>,
    #[serde(default)]
    pub product_ontology_url: Option<String>,
    pub confidence: u8,
    pub sources: u8,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub cached_at: DateTime<Utc>,
}

impl CacheRecord {
    pub fn from_entity(entity: &EnrichedEntity, cached_at: DateTime<Utc>) -> Self {
        Self {
            wikipedia_url: entity.wikipedia_url.clone(),
            wikidata_url: entity.wikidata_url.clone(),
            wikidata_id: entity.wikidata_id.clone(),
            knowledge_graph: entity.knowledge_graph.clone(),
            product_ontology_url: entity.product_ontology_url.clone(),
            confidence: entity.confidence,
            sources: entity.sources,
            description: entity.description.clone(),
            image_url: entity.image_url.clone(),
            cached_at,
        }
    }

    /// Rebuild an entity under the caller's original name
    pub fn into_entity(self, name: impl Into<String>) -> EnrichedEntity {
        EnrichedEntity {
            wikipedia_url: self.wikipedia_url,
            wikidata_url: self.wikidata_url,
            wikidata_id: self.wikidata_id,
            knowledge_graph: self.knowledge_graph,
            product_ontology_url: self.product_ontology_url,
            confidence: self.confidence,
            sources: self.sources,
            description: self.description,
            image_url: self.image_url,
            ..EnrichedEntity::unenriched(name)
        }
    }
}

/// Cache occupancy summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// All rows, expired included
    pub entries: i64,
    /// Rows still inside their freshness window
    pub live_entries: i64,
    /// Sum of hit counters over all rows
    pub total_hits: i64,
}

/// Entity cache backend
///
/// The `_at` variants take the clock explicitly; `get`/`put` use the
/// current time.
#[async_trait]
pub trait EntityCache: Send + Sync {
    /// Fresh record for `name`, bumping its hit counter
    async fn get_at(&self, name: &str, now: DateTime<Utc>) -> Result<Option<CacheRecord>>;

    /// Upsert `entity` under `name` (last write wins)
    async fn put_at(&self, name: &str, entity: &EnrichedEntity, now: DateTime<Utc>) -> Result<()>;

    async fn get(&self, name: &str) -> Result<Option<CacheRecord>> {
        self.get_at(name, now()).await
    }

    async fn put(&self, name: &str, entity: &EnrichedEntity) -> Result<()> {
        self.put_at(name, entity, now()).await
    }
}

/// SQLite-backed cache over `enriched_entity_cache`
#[derive(Clone)]
pub struct SqliteEntityCache {
    pool: SqlitePool,
    ttl: Duration,
    max_lock_wait_ms: u64,
}

impl SqliteEntityCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            ttl: Duration::days(CACHE_TTL_DAYS),
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Delete rows whose expiry has passed, returning how many went
    pub async fn purge_expired(&self) -> Result<u64> {
        self.purge_expired_at(now()).await
    }

    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<u64> {
        let cutoff = format_timestamp(&now);
        let pool = &self.pool;

        let removed = retry_on_lock("cache purge", self.max_lock_wait_ms, || {
            let cutoff = cutoff.clone();
            async move {
                let result = sqlx::query("DELETE FROM enriched_entity_cache WHERE expires_at <= ?")
                    .bind(cutoff)
                    .execute(pool)
                    .await?;
                Ok::<_, Error>(result.rows_affected())
            }
        })
        .await?;

        tracing::info!(removed, "Purged expired cache entries");
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        self.stats_at(now()).await
    }

    pub async fn stats_at(&self, now: DateTime<Utc>) -> Result<CacheStats> {
        let (entries, live_entries, total_hits): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN expires_at > ? THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(hit_count), 0)
            FROM enriched_entity_cache
            "#,
        )
        .bind(format_timestamp(&now))
        .fetch_one(&self.pool)
        .await?;

        Ok(CacheStats {
            entries,
            live_entries,
            total_hits,
        })
    }

    /// Hit counter for a name, expired rows included
    pub async fn hit_count(&self, name: &str) -> Result<Option<i64>> {
        let count: Option<i64> = sqlx::query_scalar(
            "SELECT hit_count FROM enriched_entity_cache WHERE entity_name_normalized = ?",
        )
        .bind(normalize_key(name))
        .fetch_optional(&self.pool)
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl EntityCache for SqliteEntityCache {
    async fn get_at(&self, name: &str, now: DateTime<Utc>) -> Result<Option<CacheRecord>> {
        let key = normalize_key(name);

        let row: Option<(String,)> = sqlx::query_as(
            "SELECT entity_data FROM enriched_entity_cache
             WHERE entity_name_normalized = ? AND expires_at > ?",
        )
        .bind(&key)
        .bind(format_timestamp(&now))
        .fetch_optional(&self.pool)
        .await?;

        let Some((data,)) = row else {
            return Ok(None);
        };

        let record: CacheRecord = serde_json::from_str(&data)
            .map_err(|e| Error::Internal(format!("Corrupt cache entry '{}': {}", key, e)))?;

        let pool = &self.pool;
        let counted = retry_on_lock("cache hit count", self.max_lock_wait_ms, || {
            let key = key.clone();
            async move {
                sqlx::query(
                    "UPDATE enriched_entity_cache SET hit_count = hit_count + 1
                     WHERE entity_name_normalized = ?",
                )
                .bind(key)
                .execute(pool)
                .await?;
                Ok::<_, Error>(())
            }
        })
        .await;
        if let Err(e) = counted {
            warn!(entity = %name, error = %e, "Cache hit count update failed");
        }

        debug!(entity = %name, "Cache hit");
        Ok(Some(record))
    }

    async fn put_at(&self, name: &str, entity: &EnrichedEntity, now: DateTime<Utc>) -> Result<()> {
        let key = normalize_key(name);
        let record = CacheRecord::from_entity(entity, now);
        let data = serde_json::to_string(&record)
            .map_err(|e| Error::Internal(format!("Serialize cache entry failed: {}", e)))?;
        let confidence = i64::from(record.confidence);
        let sources = i64::from(record.sources);
        let cached_at = format_timestamp(&now);
        let expires_at = format_timestamp(&(now + self.ttl));
        let pool = &self.pool;

        retry_on_lock("cache write", self.max_lock_wait_ms, || {
            let key = key.clone();
            let data = data.clone();
            let cached_at = cached_at.clone();
            let expires_at = expires_at.clone();
            async move {
                sqlx::query(
                    r#"
                    INSERT INTO enriched_entity_cache
                        (entity_name_normalized, entity_name, entity_data, confidence, sources,
                         cached_at, expires_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT(entity_name_normalized) DO UPDATE SET
                        entity_name = excluded.entity_name,
                        entity_data = excluded.entity_data,
                        confidence = excluded.confidence,
                        sources = excluded.sources,
                        cached_at = excluded.cached_at,
                        expires_at = excluded.expires_at
                    "#,
                )
                .bind(key)
                .bind(name)
                .bind(data)
                .bind(confidence)
                .bind(sources)
                .bind(cached_at)
                .bind(expires_at)
                .execute(pool)
                .await?;
                Ok::<_, Error>(())
            }
        })
        .await
    }
}
