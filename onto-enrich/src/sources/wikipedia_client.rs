//! Wikipedia client
//!
//! Searches the MediaWiki action API for the entity name (top 5 results),
//! picks the best title with the disambiguation matcher and fetches the
//! plain-text intro of the winner.
//!
//! # API Reference
//! - Search: `action=query&list=search&srsearch=<name>&srlimit=5`
//! - Extract: `action=query&prop=extracts&exintro=1&explaintext=1&titles=<title>`

use super::{encode_component, read_json, EntitySource, LookupContext, SourceEndpoints, SourceError};
use crate::matcher;
use crate::types::{SourceKind, WikipediaMatch};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Number of search results considered by the matcher
const SEARCH_LIMIT: &str = "5";

/// Maximum description length in characters
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Wikipedia search + extract client
pub struct WikipediaClient {
    http_client: Client,
    api_url: String,
    article_base: String,
}

impl WikipediaClient {
    pub fn new(http_client: Client, endpoints: &SourceEndpoints) -> Self {
        Self {
            http_client,
            api_url: endpoints.wikipedia_api.clone(),
            article_base: endpoints.wikipedia_article_base.clone(),
        }
    }

    /// Full-text search, returning candidate titles in ranking order
    pub async fn search_titles(&self, name: &str) -> Result<Vec<String>, SourceError> {
        let response = self
            .http_client
            .get(&self.api_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", name),
                ("format", "json"),
                ("srlimit", SEARCH_LIMIT),
            ])
            .send()
            .await?;

        let body: SearchResponse = read_json(response).await?;

        Ok(body
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    /// Intro extract for a page, truncated to [`MAX_DESCRIPTION_CHARS`]
    pub async fn fetch_extract(&self, title: &str) -> Result<Option<String>, SourceError> {
        let response = self
            .http_client
            .get(&self.api_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("titles", title),
                ("format", "json"),
            ])
            .send()
            .await?;

        let body: ExtractResponse = read_json(response).await?;

        let extract = body
            .query
            .and_then(|q| q.pages.into_values().next())
            .and_then(|page| page.extract)
            .map(|text| truncate_chars(text.trim(), MAX_DESCRIPTION_CHARS))
            .filter(|text| !text.is_empty());

        Ok(extract)
    }

    /// Canonical article URL for a title
    pub fn article_url(&self, title: &str) -> String {
        article_url(&self.article_base, title)
    }
}

/// Canonical article URL: spaces become underscores, then component encoding
pub fn article_url(base: &str, title: &str) -> String {
    format!("{}{}", base, encode_component(&title.replace(' ', "_")))
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[async_trait]
impl EntitySource for WikipediaClient {
    type Output = WikipediaMatch;

    fn kind(&self) -> SourceKind {
        SourceKind::Wikipedia
    }

    async fn lookup(
        &self,
        name: &str,
        _ctx: &LookupContext,
    ) -> Result<Option<WikipediaMatch>, SourceError> {
        let titles = self.search_titles(name).await?;
        if titles.is_empty() {
            debug!(entity = %name, "Wikipedia search returned no results");
            return Ok(None);
        }

        let best = matcher::best_candidate(name, titles.iter().map(String::as_str));
        let best_score = best.map(|b| b.score).unwrap_or(0);

        let Some(best) = best.filter(|b| b.score >= matcher::MIN_MATCH_SCORE) else {
            info!(entity = %name, best_score, "Wikipedia: no acceptable match");
            return Ok(None);
        };

        let title = titles[best.index].clone();
        info!(entity = %name, title = %title, score = best.score, "Wikipedia: matched");

        // A missing extract does not invalidate the match
        let description = match self.fetch_extract(&title).await {
            Ok(description) => description,
            Err(e) => {
                warn!(entity = %name, title = %title, error = %e, "Wikipedia extract fetch failed");
                None
            }
        };

        Ok(Some(WikipediaMatch {
            url: self.article_url(&title),
            title,
            description,
            score: best.score,
        }))
    }
}

// ============================================================================
// Wikipedia API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: HashMap<String, ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    extract: Option<String>,
}
