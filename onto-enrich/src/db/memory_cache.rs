//! In-process entity cache
//!
//! Same expiry and hit-count semantics as the SQLite cache, without
//! persistence. Used when no database is configured and in tests.

use super::entity_cache::{normalize_key, CacheRecord, EntityCache, CACHE_TTL_DAYS};
use crate::types::EnrichedEntity;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use onto_common::{Error, Result};
use std::collections::HashMap;
use std::sync::Mutex;

struct Slot {
    record: CacheRecord,
    expires_at: DateTime<Utc>,
    hit_count: u64,
}

/// HashMap-backed cache
pub struct MemoryEntityCache {
    ttl: Duration,
    slots: Mutex<HashMap<String, Slot>>,
}

impl MemoryEntityCache {
    pub fn new() -> Self {
        Self {
            ttl: Duration::days(CACHE_TTL_DAYS),
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Hit counter for a name, expired entries included
    pub fn hit_count(&self, name: &str) -> Option<u64> {
        self.slots
            .lock()
            .ok()?
            .get(&normalize_key(name))
            .map(|slot| slot.hit_count)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryEntityCache {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> Error {
    Error::Internal("Memory cache lock poisoned".to_string())
}

#[async_trait]
impl EntityCache for MemoryEntityCache {
    async fn get_at(&self, name: &str, now: DateTime<Utc>) -> Result<Option<CacheRecord>> {
        let mut slots = self.slots.lock().map_err(|_| poisoned())?;

        match slots.get_mut(&normalize_key(name)) {
            Some(slot) if slot.expires_at > now => {
                slot.hit_count += 1;
                Ok(Some(slot.record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn put_at(&self, name: &str, entity: &EnrichedEntity, now: DateTime<Utc>) -> Result<()> {
        let mut slots = self.slots.lock().map_err(|_| poisoned())?;
        let record = CacheRecord::from_entity(entity, now);
        let expires_at = now + self.ttl;

        slots
            .entry(normalize_key(name))
            .and_modify(|slot| {
                slot.record = record.clone();
                slot.expires_at = expires_at;
            })
            .or_insert_with(|| Slot {
                record,
                expires_at,
                hit_count: 0,
            });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entity() -> EnrichedEntity {
        let mut entity = EnrichedEntity::unenriched("Acme Corp");
        entity.confidence = 80;
        entity.sources = 3;
        entity
    }

    #[tokio::test]
    async fn test_round_trip_and_expiry() {
        let cache = MemoryEntityCache::new();
        let t0 = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();

        cache.put_at("Acme Corp", &entity(), t0).await.unwrap();

        let hit = cache.get_at("ACME CORP ", t0 + Duration::days(1)).await.unwrap();
        assert_eq!(hit.map(|r| (r.confidence, r.sources)), Some((80, 3)));
        assert_eq!(cache.hit_count("acme corp"), Some(1));

        let miss = cache.get_at("Acme Corp", t0 + Duration::days(7)).await.unwrap();
        assert!(miss.is_none());
        assert_eq!(cache.hit_count("acme corp"), Some(1));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_custom_ttl() {
        let cache = MemoryEntityCache::new().with_ttl(Duration::hours(1));
        let t0 = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();

        cache.put_at("Acme Corp", &entity(), t0).await.unwrap();
        assert!(cache
            .get_at("Acme Corp", t0 + Duration::minutes(61))
            .await
            .unwrap()
            .is_none());
    }
}
