//! Enrichment orchestrator
//!
//! Drives a batch of entity names through cache lookup and source fan-out,
//! one entity at a time:
//!
//! 1. Cache check (unless `use_cache` is off)
//! 2. Breaker admission ([`BatchState::decide`]); once tripped, every
//!    remaining entity is a placeholder
//! 3. Sources: Wikipedia → Wikidata (only after a Wikipedia match) →
//!    Knowledge Graph → ProductOntology
//! 4. Confidence aggregation, cache write when the result clears the
//!    quality bar
//! 5. Rate-limit pause before the next adapter-backed entity
//!
//! The output always has the same length and order as the input.

pub mod batch_state;

pub use batch_state::{BatchState, BatchSummary, Decision, Outcome};

use crate::confidence::{ConfidenceAggregator, SourceWeights};
use crate::db::entity_cache::{meets_cache_quality_bar, EntityCache};
use crate::error::EnrichError;
use crate::sources::{run_source, LookupContext, SourceSet};
use crate::types::{EnrichedEntity, EnrichmentOptions, SourceKind};
use futures::FutureExt;
use onto_common::time::millis_to_duration;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Batch enrichment driver
///
/// Sources and cache are injected at construction; the orchestrator holds
/// no global state and can serve concurrent batches.
#[derive(Clone)]
pub struct EnrichmentOrchestrator {
    sources: SourceSet,
    cache: Option<Arc<dyn EntityCache>>,
    weights: SourceWeights,
}

impl EnrichmentOrchestrator {
    pub fn new(sources: SourceSet) -> Self {
        Self {
            sources,
            cache: None,
            weights: SourceWeights::default(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn EntityCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Enrich a batch, preserving input order
    pub async fn enrich_entities<S>(&self, names: &[S], options: &EnrichmentOptions) -> Vec<EnrichedEntity>
    where
        S: AsRef<str> + Sync,
    {
        self.enrich_entities_with_summary(names, options).await.0
    }

    /// Enrich a batch and report how each entity was resolved
    pub async fn enrich_entities_with_summary<S>(
        &self,
        names: &[S],
        options: &EnrichmentOptions,
    ) -> (Vec<EnrichedEntity>, BatchSummary)
    where
        S: AsRef<str> + Sync,
    {
        let use_cache = options.use_cache && self.cache.is_some();
        if !options.use_cache {
            info!("Entity cache bypassed for this batch");
        }

        let mut state = BatchState::new(options.max_entities, names.len());
        let mut results = Vec::with_capacity(names.len());

        for (index, name) in names.iter().enumerate() {
            let name = name.as_ref();

            let cached = if use_cache && !state.tripped() {
                self.cached(name).await
            } else {
                None
            };

            let decision = state.decide(cached.is_some());
            let (entity, outcome) = match (decision, cached) {
                (Decision::UseCached, Some(entity)) => (entity, Outcome::CacheHit),
                (Decision::SkipByBreaker, _) => {
                    if !state.tripped() {
                        info!(
                            entity = %name,
                            budget = state.budget(),
                            remaining = names.len() - index,
                            "Circuit breaker tripped, skipping rest of batch"
                        );
                    }
                    (EnrichedEntity::unenriched(name), Outcome::SkippedByBreaker)
                }
                _ => match self.enrich_isolated(name, options).await {
                    Ok(entity) => {
                        if options.cache_results {
                            self.store(&entity).await;
                        }
                        (entity, Outcome::Enriched)
                    }
                    Err(e) => {
                        warn!(entity = %name, error = %e, "Entity enrichment failed, using placeholder");
                        (EnrichedEntity::unenriched(name), Outcome::Failed)
                    }
                },
            };

            results.push(entity);

            if state.apply(index, outcome) && options.rate_limit_ms > 0 {
                tokio::time::sleep(millis_to_duration(options.rate_limit_ms)).await;
            }
        }

        let summary = state.summary();
        info!(
            processed = summary.processed,
            cache_hits = summary.cache_hits,
            adapter_backed = summary.adapter_backed,
            skipped_by_breaker = summary.skipped_by_breaker,
            failed = summary.failed,
            "Enrichment batch complete"
        );

        (results, summary)
    }

    /// Query the enabled sources for one entity, bypassing the cache
    pub async fn enrich_single(&self, name: &str, options: &EnrichmentOptions) -> EnrichedEntity {
        let mut entity = EnrichedEntity::unenriched(name);
        let mut confidence = ConfidenceAggregator::new(self.weights);
        let mut ctx = LookupContext::default();

        if options.enable_wikipedia {
            if let Some(found) = run_source(self.sources.wikipedia.as_ref(), name, &ctx).await {
                entity.wikipedia_url = Some(found.url);
                entity.description = found.description;
                ctx.wikipedia_title = Some(found.title);
                confidence.add(SourceKind::Wikipedia);
            }
        }

        if options.enable_wikidata && entity.wikipedia_url.is_some() {
            if let Some(found) = run_source(self.sources.wikidata.as_ref(), name, &ctx).await {
                entity.wikidata_url = Some(found.url);
                entity.wikidata_id = Some(found.id);
                entity.image_url = found.image_url;
                confidence.add(SourceKind::Wikidata);
            }
        }

        if options.enable_knowledge_graph {
            if let Some(link) = run_source(self.sources.knowledge_graph.as_ref(), name, &ctx).await {
                if link.is_verified() {
                    confidence.add(SourceKind::KnowledgeGraph);
                }
                entity.knowledge_graph = Some(link);
            }
        }

        if options.enable_product_ontology {
            if let Some(found) = run_source(self.sources.product_ontology.as_ref(), name, &ctx).await {
                entity.product_ontology_url = Some(found.url);
                confidence.add(SourceKind::ProductOntology);
            }
        }

        entity.confidence = confidence.confidence();
        entity.sources = confidence.sources();

        info!(
            entity = %name,
            confidence = entity.confidence,
            sources = entity.sources,
            contributed = ?confidence.contributed(),
            "Entity enriched"
        );

        entity
    }

    /// [`Self::enrich_single`] with panic isolation
    async fn enrich_isolated(
        &self,
        name: &str,
        options: &EnrichmentOptions,
    ) -> Result<EnrichedEntity, EnrichError> {
        AssertUnwindSafe(self.enrich_single(name, options))
            .catch_unwind()
            .await
            .map_err(|payload| EnrichError::from_panic(name, payload))
    }

    /// Cache read; failures count as a miss
    async fn cached(&self, name: &str) -> Option<EnrichedEntity> {
        let cache = self.cache.as_ref()?;
        match cache.get(name).await {
            Ok(Some(record)) => {
                debug!(entity = %name, "Serving entity from cache");
                Some(record.into_entity(name))
            }
            Ok(None) => None,
            Err(e) => {
                warn!(entity = %name, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Cache write gated by the quality bar; failures are logged and dropped
    async fn store(&self, entity: &EnrichedEntity) {
        let Some(cache) = &self.cache else {
            return;
        };
        if !meets_cache_quality_bar(entity) {
            return;
        }

        match cache.put(&entity.name, entity).await {
            Ok(()) => info!(
                entity = %entity.name,
                confidence = entity.confidence,
                sources = entity.sources,
                "Cached enriched entity"
            ),
            Err(e) => warn!(entity = %entity.name, error = %e, "Cache write failed"),
        }
    }
}
