//! Google Knowledge Graph client
//!
//! Credential-gated entity search. With no API key configured, or when the
//! graph answers with nothing usable, the client degrades to a plain
//! web-search link ([`KnowledgeGraphLink::SearchFallback`]) instead of an
//! identifier. Transport failures are errors and become "no match" at the
//! adapter boundary.
//!
//! # API Reference
//! - `GET entities:search?query=<name>&key=<key>&limit=1`
//! - Identifier: `itemListElement[0].result["@id"]`, `kg:` prefix stripped

use super::{web_search_url, EntitySource, LookupContext, SourceEndpoints, SourceError};
use crate::types::{KnowledgeGraphLink, SourceKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

const ID_PREFIX: &str = "kg:";

/// Knowledge Graph Search API client
pub struct KnowledgeGraphClient {
    http_client: Client,
    api_url: String,
    entity_base: String,
    web_search_base: String,
    api_key: Option<String>,
}

impl KnowledgeGraphClient {
    /// Blank keys are treated as absent
    pub fn new(http_client: Client, endpoints: &SourceEndpoints, api_key: Option<String>) -> Self {
        Self {
            http_client,
            api_url: endpoints.knowledge_graph_api.clone(),
            entity_base: endpoints.knowledge_graph_entity_base.clone(),
            web_search_base: endpoints.web_search_base.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn fallback(&self, name: &str) -> KnowledgeGraphLink {
        KnowledgeGraphLink::SearchFallback {
            url: web_search_url(&self.web_search_base, name),
        }
    }

    /// Top search hit's identifier
    ///
    /// `Ok(None)` covers empty results, missing `@id`, and non-success
    /// statuses; transport failures are `Err`.
    async fn search_id(&self, name: &str, api_key: &str) -> Result<Option<String>, SourceError> {
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[("query", name), ("key", api_key), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(entity = %name, status = status.as_u16(), "Knowledge Graph returned error status");
            return Ok(None);
        }

        let body: SearchResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(entity = %name, error = %e, "Knowledge Graph response did not parse");
                return Ok(None);
            }
        };

        Ok(body
            .item_list_element
            .into_iter()
            .next()
            .and_then(|item| item.result)
            .and_then(|result| result.id)
            .map(|id| strip_id_prefix(&id).to_string())
            .filter(|id| !id.is_empty()))
    }
}

/// Remove the `kg:` namespace from a graph identifier
pub fn strip_id_prefix(id: &str) -> &str {
    id.strip_prefix(ID_PREFIX).unwrap_or(id)
}

#[async_trait]
impl EntitySource for KnowledgeGraphClient {
    type Output = KnowledgeGraphLink;

    fn kind(&self) -> SourceKind {
        SourceKind::KnowledgeGraph
    }

    async fn lookup(
        &self,
        name: &str,
        _ctx: &LookupContext,
    ) -> Result<Option<KnowledgeGraphLink>, SourceError> {
        let Some(api_key) = &self.api_key else {
            debug!(entity = %name, "No Knowledge Graph key, using search fallback");
            return Ok(Some(self.fallback(name)));
        };

        match self.search_id(name, api_key).await? {
            Some(id) => {
                debug!(entity = %name, id = %id, "Knowledge Graph: verified id");
                Ok(Some(KnowledgeGraphLink::Verified {
                    url: format!("{}{}", self.entity_base, id),
                    id,
                }))
            }
            None => Ok(Some(self.fallback(name))),
        }
    }
}

// ============================================================================
// Knowledge Graph Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    item_list_element: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "@id")]
    id: Option<String>,
}
