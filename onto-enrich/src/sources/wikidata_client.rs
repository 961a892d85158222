//! Wikidata client
//!
//! Resolves a Wikidata Q-identifier for the entity:
//! 1. From the matched Wikipedia page's `wikibase_item` page prop (primary)
//! 2. From a direct `wbsearchentities` search on the name (fallback, only
//!    when the primary path yields nothing)
//!
//! Once resolved, claim P18 is read for a representative image. Image lookup
//! failures leave the identifier intact.

use super::{encode_component, read_json, EntitySource, LookupContext, SourceEndpoints, SourceError};
use crate::types::{SourceKind, WikidataMatch};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Wikidata property for "image"
const IMAGE_PROPERTY: &str = "P18";

/// Commons thumbnail width requested for entity images
const IMAGE_WIDTH: u32 = 300;

/// Wikidata identifier + image client
pub struct WikidataClient {
    http_client: Client,
    wikipedia_api: String,
    api_url: String,
    entity_base: String,
    commons_file_base: String,
}

impl WikidataClient {
    pub fn new(http_client: Client, endpoints: &SourceEndpoints) -> Self {
        Self {
            http_client,
            wikipedia_api: endpoints.wikipedia_api.clone(),
            api_url: endpoints.wikidata_api.clone(),
            entity_base: endpoints.wikidata_entity_base.clone(),
            commons_file_base: endpoints.commons_file_base.clone(),
        }
    }

    /// `wikibase_item` page prop of a Wikipedia article
    pub async fn id_from_wikipedia_page(&self, title: &str) -> Result<Option<String>, SourceError> {
        let response = self
            .http_client
            .get(&self.wikipedia_api)
            .query(&[
                ("action", "query"),
                ("prop", "pageprops"),
                ("titles", title),
                ("format", "json"),
            ])
            .send()
            .await?;

        let body: PagePropsResponse = read_json(response).await?;

        Ok(body
            .query
            .and_then(|q| q.pages.into_values().next())
            .and_then(|page| page.pageprops)
            .and_then(|props| props.wikibase_item)
            .filter(|id| !id.is_empty()))
    }

    /// Top `wbsearchentities` hit for a name
    pub async fn search_id(&self, name: &str) -> Result<Option<String>, SourceError> {
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[
                ("action", "wbsearchentities"),
                ("search", name),
                ("language", "en"),
                ("format", "json"),
                ("limit", "1"),
            ])
            .send()
            .await?;

        let body: EntitySearchResponse = read_json(response).await?;

        Ok(body
            .search
            .into_iter()
            .next()
            .map(|hit| hit.id)
            .filter(|id| !id.is_empty()))
    }

    /// Commons image URL from claim P18, if the item has one
    pub async fn image_url(&self, id: &str) -> Result<Option<String>, SourceError> {
        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[
                ("action", "wbgetentities"),
                ("ids", id),
                ("props", "claims"),
                ("format", "json"),
            ])
            .send()
            .await?;

        let mut body: EntitiesResponse = read_json(response).await?;

        let file_name = body
            .entities
            .remove(id)
            .and_then(|mut entity| entity.claims.remove(IMAGE_PROPERTY))
            .and_then(|claims| claims.into_iter().next())
            .and_then(|claim| claim.mainsnak.datavalue)
            .and_then(|value| value.value.as_str().map(str::to_string));

        Ok(file_name.map(|file| commons_image_url(&self.commons_file_base, &file)))
    }

    async fn resolve_id(&self, name: &str, ctx: &LookupContext) -> Result<Option<String>, SourceError> {
        if let Some(title) = &ctx.wikipedia_title {
            match self.id_from_wikipedia_page(title).await {
                Ok(Some(id)) => {
                    debug!(entity = %name, id = %id, "Wikidata id from Wikipedia page props");
                    return Ok(Some(id));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(entity = %name, error = %e, "Wikipedia page props lookup failed, trying direct search");
                }
            }
        }

        let id = self.search_id(name).await?;
        if let Some(id) = &id {
            debug!(entity = %name, id = %id, "Wikidata id from direct search");
        }
        Ok(id)
    }
}

/// Commons `Special:FilePath` URL for an image file name
pub fn commons_image_url(base: &str, file_name: &str) -> String {
    format!("{}{}?width={}", base, encode_component(file_name), IMAGE_WIDTH)
}

#[async_trait]
impl EntitySource for WikidataClient {
    type Output = WikidataMatch;

    fn kind(&self) -> SourceKind {
        SourceKind::Wikidata
    }

    async fn lookup(
        &self,
        name: &str,
        ctx: &LookupContext,
    ) -> Result<Option<WikidataMatch>, SourceError> {
        let Some(id) = self.resolve_id(name, ctx).await? else {
            return Ok(None);
        };

        let image_url = match self.image_url(&id).await {
            Ok(url) => url,
            Err(e) => {
                warn!(entity = %name, id = %id, error = %e, "Wikidata image lookup failed");
                None
            }
        };

        Ok(Some(WikidataMatch {
            url: format!("{}{}", self.entity_base, id),
            id,
            image_url,
        }))
    }
}

// ============================================================================
// Wikidata / MediaWiki Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct PagePropsResponse {
    query: Option<PagePropsQuery>,
}

#[derive(Debug, Deserialize)]
struct PagePropsQuery {
    #[serde(default)]
    pages: HashMap<String, PagePropsPage>,
}

#[derive(Debug, Deserialize)]
struct PagePropsPage {
    pageprops: Option<PageProps>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    wikibase_item: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntitySearchResponse {
    #[serde(default)]
    search: Vec<EntitySearchHit>,
}

#[derive(Debug, Deserialize)]
struct EntitySearchHit {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EntitiesResponse {
    #[serde(default)]
    entities: HashMap<String, Entity>,
}

#[derive(Debug, Deserialize)]
struct Entity {
    #[serde(default)]
    claims: HashMap<String, Vec<Claim>>,
}

#[derive(Debug, Deserialize)]
struct Claim {
    mainsnak: Snak,
}

#[derive(Debug, Deserialize)]
struct Snak {
    datavalue: Option<DataValue>,
}

#[derive(Debug, Deserialize)]
struct DataValue {
    value: serde_json::Value,
}
