//! onto-enrich library interface
//!
//! Entity enrichment pipeline: takes a batch of entity names and returns
//! disambiguated, linked, confidence-scored records using Wikipedia,
//! Wikidata, the Google Knowledge Graph and ProductOntology, backed by a
//! SQLite cache.

pub mod confidence;
pub mod config;
pub mod db;
pub mod error;
pub mod matcher;
pub mod orchestrator;
pub mod sources;
pub mod types;
pub mod utils;

pub use crate::error::{EnrichError, Result};
pub use crate::orchestrator::{BatchSummary, EnrichmentOrchestrator};
pub use crate::types::{EnrichedEntity, EnrichmentOptions, EntityType, KnowledgeGraphLink};

use onto_common::config::TomlConfig;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;

/// Everything a caller needs to run batches
pub struct EnrichmentService {
    pub db: SqlitePool,
    pub cache: db::SqliteEntityCache,
    pub orchestrator: EnrichmentOrchestrator,
    /// Defaults from the `[enrichment]` table
    pub options: EnrichmentOptions,
}

/// Open the database and wire HTTP sources and cache from configuration
pub async fn bootstrap(db_path: &Path, toml_config: &TomlConfig) -> Result<EnrichmentService> {
    let db = db::init_database_pool(db_path).await?;

    let api_key = config::resolve_knowledge_graph_api_key(&db, toml_config).await?;
    let source_config = config::load_source_config(toml_config, api_key)?;
    let options = config::load_enrichment_options(toml_config)?;

    let sources = sources::SourceSet::http(&source_config)?;
    let cache = db::SqliteEntityCache::new(db.clone());
    let orchestrator = EnrichmentOrchestrator::new(sources).with_cache(Arc::new(cache.clone()));

    Ok(EnrichmentService {
        db,
        cache,
        orchestrator,
        options,
    })
}
