//! Core types for entity enrichment
//!
//! `EnrichedEntity` is the unit of output handed to the structured-data
//! builder. Per-source results (`WikipediaMatch`, `WikidataMatch`,
//! `KnowledgeGraphLink`, `ProductOntologyMatch`) are what each source client
//! returns before confidence aggregation.

use crate::sources::{web_search_url, DEFAULT_WEB_SEARCH_BASE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Entity taxonomy
// ============================================================================

/// Entity category supplied by the content-analysis caller
///
/// Enrichment never determines the type itself; freshly enriched and cached
/// entities come back as `Unknown` until the caller attaches one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Person,
    Organization,
    Place,
    Product,
    Event,
    CreativeWork,
    Service,
    Brand,
    Concept,
    Technology,
    MedicalCondition,
    Drug,
    FoodEstablishment,
    LocalBusiness,
    SoftwareApplication,
    WebSite,
    Thing,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl EntityType {
    const ALL: [EntityType; 18] = [
        EntityType::Person,
        EntityType::Organization,
        EntityType::Place,
        EntityType::Product,
        EntityType::Event,
        EntityType::CreativeWork,
        EntityType::Service,
        EntityType::Brand,
        EntityType::Concept,
        EntityType::Technology,
        EntityType::MedicalCondition,
        EntityType::Drug,
        EntityType::FoodEstablishment,
        EntityType::LocalBusiness,
        EntityType::SoftwareApplication,
        EntityType::WebSite,
        EntityType::Thing,
        EntityType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "Person",
            EntityType::Organization => "Organization",
            EntityType::Place => "Place",
            EntityType::Product => "Product",
            EntityType::Event => "Event",
            EntityType::CreativeWork => "CreativeWork",
            EntityType::Service => "Service",
            EntityType::Brand => "Brand",
            EntityType::Concept => "Concept",
            EntityType::Technology => "Technology",
            EntityType::MedicalCondition => "MedicalCondition",
            EntityType::Drug => "Drug",
            EntityType::FoodEstablishment => "FoodEstablishment",
            EntityType::LocalBusiness => "LocalBusiness",
            EntityType::SoftwareApplication => "SoftwareApplication",
            EntityType::WebSite => "WebSite",
            EntityType::Thing => "Thing",
            EntityType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = std::convert::Infallible;

    /// Case-insensitive; anything outside the taxonomy maps to `Unknown`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Ok(Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .unwrap_or(EntityType::Unknown))
    }
}

// ============================================================================
// Sources
// ============================================================================

/// External knowledge source identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Encyclopedia (full-text search + extract)
    Wikipedia,
    /// Structured data (stable identifiers + claims)
    Wikidata,
    /// Commercial entity graph (credential-gated)
    KnowledgeGraph,
    /// Deterministic-URL product taxonomy
    ProductOntology,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Wikipedia => "Wikipedia",
            SourceKind::Wikidata => "Wikidata",
            SourceKind::KnowledgeGraph => "KnowledgeGraph",
            SourceKind::ProductOntology => "ProductOntology",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wikipedia article selected by the disambiguation matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikipediaMatch {
    /// Article title as returned by search
    pub title: String,
    /// Canonical article URL
    pub url: String,
    /// Plain-text intro, at most 200 characters
    pub description: Option<String>,
    /// Winning matcher score (50-100)
    pub score: u8,
}

/// Wikidata item resolved for the entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikidataMatch {
    /// Q-identifier, e.g. `Q42`
    pub id: String,
    /// Entity page URL
    pub url: String,
    /// Commons image reference from claim P18
    pub image_url: Option<String>,
}

/// Knowledge Graph outcome
///
/// Only `Verified` carries an identifier. `SearchFallback` is a plain web
/// search link produced when no credential is configured or the graph
/// returned nothing usable; it never counts as a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KnowledgeGraphLink {
    Verified { id: String, url: String },
    SearchFallback { url: String },
}

impl KnowledgeGraphLink {
    pub fn is_verified(&self) -> bool {
        matches!(self, KnowledgeGraphLink::Verified { .. })
    }

    pub fn url(&self) -> &str {
        match self {
            KnowledgeGraphLink::Verified { url, .. } => url,
            KnowledgeGraphLink::SearchFallback { url } => url,
        }
    }
}

/// ProductOntology classification URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductOntologyMatch {
    pub url: String,
}

// ============================================================================
// Enriched entity
// ============================================================================

/// Enriched, confidence-scored entity record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedEntity {
    /// Original entity name as supplied by the caller (not normalized)
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikipedia_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikidata_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikidata_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_graph: Option<KnowledgeGraphLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_ontology_url: Option<String>,
    /// 0-100, additive over contributing sources
    pub confidence: u8,
    /// Number of sources that contributed a usable link (0-4)
    pub sources: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl EnrichedEntity {
    /// Zero-confidence record: not found, failed, or skipped by the breaker
    pub fn unenriched(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity_type: EntityType::Unknown,
            wikipedia_url: None,
            wikidata_url: None,
            wikidata_id: None,
            knowledge_graph: None,
            product_ontology_url: None,
            confidence: 0,
            sources: 0,
            description: None,
            image_url: None,
        }
    }

    pub fn with_entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = entity_type;
        self
    }

    pub fn is_enriched(&self) -> bool {
        self.sources > 0
    }

    /// Knowledge Graph URL, only when backed by a verified identifier
    pub fn knowledge_graph_url(&self) -> Option<&str> {
        match &self.knowledge_graph {
            Some(KnowledgeGraphLink::Verified { url, .. }) => Some(url),
            _ => None,
        }
    }

    /// Raw Knowledge Graph identifier, if one was verified
    pub fn knowledge_graph_id(&self) -> Option<&str> {
        match &self.knowledge_graph {
            Some(KnowledgeGraphLink::Verified { id, .. }) => Some(id),
            _ => None,
        }
    }

    /// Web-search link used when the graph had no identifier
    pub fn search_fallback_url(&self) -> Option<&str> {
        match &self.knowledge_graph {
            Some(KnowledgeGraphLink::SearchFallback { url }) => Some(url),
            _ => None,
        }
    }

    fn has_authoritative_source(&self) -> bool {
        self.wikipedia_url.is_some() || self.wikidata_url.is_some()
    }

    /// Graph identifier safe to emit in markup
    ///
    /// People without a Wikipedia or Wikidata match are excluded: a graph hit
    /// for a bare personal name is too often a different person.
    pub fn verified_knowledge_graph_id(&self) -> Option<&str> {
        if self.entity_type == EntityType::Person && !self.has_authoritative_source() {
            return None;
        }
        self.knowledge_graph_id()
    }

    /// Ordered identity links for `sameAs`
    ///
    /// Wikipedia, then Wikidata, then one graph-or-search link. Unverified
    /// people always get a web-search link, whether or not the graph was
    /// consulted.
    pub fn same_as_links(&self) -> Vec<String> {
        let mut links = Vec::new();

        if let Some(url) = &self.wikipedia_url {
            links.push(url.clone());
        }
        if let Some(url) = &self.wikidata_url {
            links.push(url.clone());
        }

        let unverified_person =
            self.entity_type == EntityType::Person && !self.has_authoritative_source();

        if unverified_person {
            links.push(match self.search_fallback_url() {
                Some(url) => url.to_string(),
                None => web_search_url(DEFAULT_WEB_SEARCH_BASE, &self.name),
            });
        } else if let Some(url) = self.knowledge_graph_url() {
            links.push(url.to_string());
        }

        links
    }
}

// ============================================================================
// Options
// ============================================================================

/// Per-batch enrichment options
///
/// Deserialisable so the `[enrichment]` TOML table can override defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentOptions {
    pub enable_wikipedia: bool,
    pub enable_wikidata: bool,
    pub enable_knowledge_graph: bool,
    pub enable_product_ontology: bool,
    /// Adapter-backed enrichments allowed per batch before the breaker trips
    pub max_entities: usize,
    /// Skip cache reads when false
    pub use_cache: bool,
    /// Skip cache writes when false
    pub cache_results: bool,
    /// Delay between consecutive adapter-backed enrichments
    pub rate_limit_ms: u64,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            enable_wikipedia: true,
            enable_wikidata: true,
            enable_knowledge_graph: true,
            enable_product_ontology: true,
            max_entities: 12,
            use_cache: true,
            cache_results: true,
            rate_limit_ms: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verified_graph() -> KnowledgeGraphLink {
        KnowledgeGraphLink::Verified {
            id: "/m/0abc".to_string(),
            url: "https://www.google.com/search?kgmid=/m/0abc".to_string(),
        }
    }

    #[test]
    fn test_entity_type_parse_is_case_insensitive() {
        assert_eq!("person".parse::<EntityType>().unwrap(), EntityType::Person);
        assert_eq!(" WebSite ".parse::<EntityType>().unwrap(), EntityType::WebSite);
        assert_eq!("spaceship".parse::<EntityType>().unwrap(), EntityType::Unknown);
    }

    #[test]
    fn test_entity_type_serde_names() {
        assert_eq!(serde_json::to_string(&EntityType::Unknown).unwrap(), "\"unknown\"");
        assert_eq!(serde_json::to_string(&EntityType::CreativeWork).unwrap(), "\"CreativeWork\"");
    }

    #[test]
    fn test_unenriched_placeholder() {
        let entity = EnrichedEntity::unenriched("Nothing Here");
        assert_eq!(entity.name, "Nothing Here");
        assert_eq!(entity.confidence, 0);
        assert_eq!(entity.sources, 0);
        assert!(!entity.is_enriched());
        assert!(entity.same_as_links().is_empty());
    }

    #[test]
    fn test_search_fallback_is_not_an_identifier() {
        let mut entity = EnrichedEntity::unenriched("Acme");
        entity.knowledge_graph = Some(KnowledgeGraphLink::SearchFallback {
            url: "https://www.google.com/search?q=Acme".to_string(),
        });

        assert_eq!(entity.knowledge_graph_id(), None);
        assert_eq!(entity.knowledge_graph_url(), None);
        assert_eq!(
            entity.search_fallback_url(),
            Some("https://www.google.com/search?q=Acme")
        );
    }

    #[test]
    fn test_same_as_order_for_organization() {
        let mut entity = EnrichedEntity::unenriched("Acme").with_entity_type(EntityType::Organization);
        entity.wikipedia_url = Some("https://en.wikipedia.org/wiki/Acme".to_string());
        entity.wikidata_url = Some("https://www.wikidata.org/wiki/Q1".to_string());
        entity.knowledge_graph = Some(verified_graph());

        assert_eq!(
            entity.same_as_links(),
            vec![
                "https://en.wikipedia.org/wiki/Acme".to_string(),
                "https://www.wikidata.org/wiki/Q1".to_string(),
                "https://www.google.com/search?kgmid=/m/0abc".to_string(),
            ]
        );
        assert_eq!(entity.verified_knowledge_graph_id(), Some("/m/0abc"));
    }

    #[test]
    fn test_unverified_person_uses_search_link() {
        let mut entity = EnrichedEntity::unenriched("Jane Doe").with_entity_type(EntityType::Person);
        entity.knowledge_graph = Some(verified_graph());

        assert_eq!(
            entity.same_as_links(),
            vec!["https://www.google.com/search?q=Jane%20Doe".to_string()]
        );
        assert_eq!(entity.verified_knowledge_graph_id(), None);
    }

    #[test]
    fn test_unverified_person_gets_search_link_without_graph_lookup() {
        let entity = EnrichedEntity::unenriched("Jane Doe").with_entity_type(EntityType::Person);
        assert!(entity.knowledge_graph.is_none());

        assert_eq!(
            entity.same_as_links(),
            vec!["https://www.google.com/search?q=Jane%20Doe".to_string()]
        );
    }

    #[test]
    fn test_options_defaults() {
        let options = EnrichmentOptions::default();
        assert!(options.enable_wikipedia && options.enable_wikidata);
        assert!(options.enable_knowledge_graph && options.enable_product_ontology);
        assert_eq!(options.max_entities, 12);
        assert!(options.use_cache);
        assert!(options.cache_results);
        assert_eq!(options.rate_limit_ms, 500);
    }

    #[test]
    fn test_options_partial_toml_keeps_defaults() {
        let options: EnrichmentOptions = toml::from_str("max_entities = 4\nuse_cache = false").unwrap();
        assert_eq!(options.max_entities, 4);
        assert!(!options.use_cache);
        assert_eq!(options.rate_limit_ms, 500);
    }

    #[test]
    fn test_entity_json_shape() {
        let mut entity = EnrichedEntity::unenriched("Acme");
        entity.wikipedia_url = Some("https://en.wikipedia.org/wiki/Acme".to_string());
        entity.confidence = 30;
        entity.sources = 1;

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["name"], "Acme");
        assert_eq!(json["type"], "unknown");
        assert_eq!(json["wikipediaUrl"], "https://en.wikipedia.org/wiki/Acme");
        assert!(json.get("wikidataUrl").is_none());
    }
}
