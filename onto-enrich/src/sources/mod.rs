//! External knowledge source clients
//!
//! Four independent clients, one per source:
//! 1. **wikipedia_client** - full-text search + disambiguation + intro extract
//! 2. **wikidata_client** - Q-identifier via page props or direct search, P18 image
//! 3. **knowledge_graph_client** - Google Knowledge Graph id, search URL fallback
//! 4. **product_ontology_client** - deterministic slug URL with existence check
//!
//! Each client implements [`EntitySource`]. Raw lookups return
//! `Result<Option<_>, SourceError>`; [`run_source`] is the adapter boundary
//! that turns every error into "no match" so one source's outage never fails
//! an entity.

pub mod knowledge_graph_client;
pub mod product_ontology_client;
pub mod wikidata_client;
pub mod wikipedia_client;

pub use knowledge_graph_client::KnowledgeGraphClient;
pub use product_ontology_client::{CheckFailurePolicy, ProductOntologyClient};
pub use wikidata_client::WikidataClient;
pub use wikipedia_client::WikipediaClient;

use crate::types::{
    KnowledgeGraphLink, ProductOntologyMatch, SourceKind, WikidataMatch, WikipediaMatch,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// User-Agent sent to every source (Wikimedia requires a contact)
pub const USER_AGENT: &str = "Ontologizer/1.0 (https://theontologizer.com; contact@theontologizer.com)";

/// Default timeout for a single source request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

pub const DEFAULT_WIKIPEDIA_API: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_WIKIPEDIA_ARTICLE_BASE: &str = "https://en.wikipedia.org/wiki/";
pub const DEFAULT_WIKIDATA_API: &str = "https://www.wikidata.org/w/api.php";
pub const DEFAULT_WIKIDATA_ENTITY_BASE: &str = "https://www.wikidata.org/wiki/";
pub const DEFAULT_COMMONS_FILE_BASE: &str = "https://commons.wikimedia.org/wiki/Special:FilePath/";
pub const DEFAULT_KNOWLEDGE_GRAPH_API: &str = "https://kgsearch.googleapis.com/v1/entities:search";
pub const DEFAULT_KNOWLEDGE_GRAPH_ENTITY_BASE: &str = "https://www.google.com/search?kgmid=";
pub const DEFAULT_WEB_SEARCH_BASE: &str = "https://www.google.com/search?q=";
pub const DEFAULT_PRODUCT_ONTOLOGY_BASE: &str = "http://www.productontology.org/id/";

/// Source client errors
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Client could not be built from its configuration
    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for SourceError {
    /// The request URL is dropped: query strings may carry credentials
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            SourceError::Api {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

/// Results already produced for the entity by earlier sources
#[derive(Debug, Clone, Default)]
pub struct LookupContext {
    /// Title of the matched Wikipedia article
    pub wikipedia_title: Option<String>,
}

/// A single external knowledge source
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Partial enrichment produced on a match
    type Output: Send;

    fn kind(&self) -> SourceKind;

    /// Look the entity up
    ///
    /// `Ok(None)` means the source answered but had no usable match.
    async fn lookup(
        &self,
        name: &str,
        ctx: &LookupContext,
    ) -> Result<Option<Self::Output>, SourceError>;
}

/// Run one source with per-source error isolation
///
/// Errors are logged and reported as "no match".
pub async fn run_source<S>(source: &S, name: &str, ctx: &LookupContext) -> Option<S::Output>
where
    S: EntitySource + ?Sized,
{
    let kind = source.kind();
    match source.lookup(name, ctx).await {
        Ok(Some(output)) => {
            debug!(source = %kind, entity = %name, "Source matched");
            Some(output)
        }
        Ok(None) => {
            debug!(source = %kind, entity = %name, "Source had no match");
            None
        }
        Err(e) => {
            warn!(
                source = %kind,
                entity = %name,
                error = %e,
                "Source lookup failed (per-source error isolation)"
            );
            None
        }
    }
}

/// Base URLs for every source
///
/// Defaults point at the public services; tests and deployments redirect
/// them.
#[derive(Debug, Clone)]
pub struct SourceEndpoints {
    pub wikipedia_api: String,
    pub wikipedia_article_base: String,
    pub wikidata_api: String,
    pub wikidata_entity_base: String,
    pub commons_file_base: String,
    pub knowledge_graph_api: String,
    pub knowledge_graph_entity_base: String,
    pub web_search_base: String,
    pub product_ontology_base: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            wikipedia_api: DEFAULT_WIKIPEDIA_API.to_string(),
            wikipedia_article_base: DEFAULT_WIKIPEDIA_ARTICLE_BASE.to_string(),
            wikidata_api: DEFAULT_WIKIDATA_API.to_string(),
            wikidata_entity_base: DEFAULT_WIKIDATA_ENTITY_BASE.to_string(),
            commons_file_base: DEFAULT_COMMONS_FILE_BASE.to_string(),
            knowledge_graph_api: DEFAULT_KNOWLEDGE_GRAPH_API.to_string(),
            knowledge_graph_entity_base: DEFAULT_KNOWLEDGE_GRAPH_ENTITY_BASE.to_string(),
            web_search_base: DEFAULT_WEB_SEARCH_BASE.to_string(),
            product_ontology_base: DEFAULT_PRODUCT_ONTOLOGY_BASE.to_string(),
        }
    }
}

/// Everything needed to construct the HTTP-backed source set
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub endpoints: SourceEndpoints,
    pub timeout: Duration,
    /// Knowledge Graph credential; `None` selects the search URL fallback
    pub knowledge_graph_api_key: Option<String>,
    /// Issue a HEAD request before accepting a ProductOntology URL
    pub check_product_ontology: bool,
    pub check_failure_policy: CheckFailurePolicy,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoints: SourceEndpoints::default(),
            timeout: DEFAULT_TIMEOUT,
            knowledge_graph_api_key: None,
            check_product_ontology: true,
            check_failure_policy: CheckFailurePolicy::default(),
        }
    }
}

/// Build the shared HTTP client
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::NotConfigured(format!("HTTP client build failed: {}", e)))
}

/// Web-search URL for a name
pub fn web_search_url(base: &str, name: &str) -> String {
    format!("{}{}", base, encode_component(name))
}

/// Percent-encode a URL component, leaving `( ) ' ! * ~` literal
///
/// `urlencoding` escapes every byte outside `A-Z a-z 0-9 - . _ ~`; the five
/// sub-delimiters are restored afterwards. A literal `%` in the input is
/// always emitted as `%25`, so no restored sequence can come from it.
pub fn encode_component(value: &str) -> String {
    let mut encoded = urlencoding::encode(value).into_owned();
    for (escaped, literal) in [
        ("%28", "("),
        ("%29", ")"),
        ("%27", "'"),
        ("%21", "!"),
        ("%2A", "*"),
    ] {
        encoded = encoded.replace(escaped, literal);
    }
    encoded
}

/// The four sources driven by the orchestrator
///
/// Held as trait objects so tests can substitute fakes for any source.
#[derive(Clone)]
pub struct SourceSet {
    pub wikipedia: Arc<dyn EntitySource<Output = WikipediaMatch>>,
    pub wikidata: Arc<dyn EntitySource<Output = WikidataMatch>>,
    pub knowledge_graph: Arc<dyn EntitySource<Output = KnowledgeGraphLink>>,
    pub product_ontology: Arc<dyn EntitySource<Output = ProductOntologyMatch>>,
}

impl SourceSet {
    /// HTTP-backed sources sharing one client
    pub fn http(config: &SourceConfig) -> Result<Self, SourceError> {
        let http = build_http_client(config.timeout)?;
        let endpoints = &config.endpoints;

        Ok(Self {
            wikipedia: Arc::new(WikipediaClient::new(http.clone(), endpoints)),
            wikidata: Arc::new(WikidataClient::new(http.clone(), endpoints)),
            knowledge_graph: Arc::new(KnowledgeGraphClient::new(
                http.clone(),
                endpoints,
                config.knowledge_graph_api_key.clone(),
            )),
            product_ontology: Arc::new(
                ProductOntologyClient::new(http, endpoints)
                    .with_existence_check(config.check_product_ontology)
                    .with_failure_policy(config.check_failure_policy),
            ),
        })
    }
}

/// Read a JSON body, mapping non-success statuses to [`SourceError::Api`]
pub(crate) async fn read_json<T>(response: reqwest::Response) -> Result<T, SourceError>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Api {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| SourceError::Parse(e.to_string()))
}
