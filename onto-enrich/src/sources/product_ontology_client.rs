//! ProductOntology client
//!
//! ProductOntology has no search API: class URLs follow a fixed pattern
//! (`/id/<Slug>`), so the client derives the slug from the entity name and
//! optionally confirms the URL with a HEAD existence check.

use super::{EntitySource, LookupContext, SourceEndpoints, SourceError};
use crate::types::{ProductOntologyMatch, SourceKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What to do when the existence check cannot complete
///
/// A check that completes always decides by status: success accepts the URL,
/// anything else rejects it. The policy only covers transport failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckFailurePolicy {
    /// Keep the URL; the pattern is usually valid even when the check errors
    #[default]
    AssumeValid,
    /// Drop the URL
    Reject,
}

/// Deterministic ProductOntology slug
///
/// Drops everything but ASCII letters, digits and whitespace, then
/// title-cases each word and joins with underscores:
/// `"smart-phone cases"` becomes `"Smartphone_Cases"`.
pub fn product_ontology_slug(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join("_")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// ProductOntology URL builder + existence check
pub struct ProductOntologyClient {
    http_client: Client,
    base_url: String,
    check_exists: bool,
    failure_policy: CheckFailurePolicy,
}

impl ProductOntologyClient {
    pub fn new(http_client: Client, endpoints: &SourceEndpoints) -> Self {
        Self {
            http_client,
            base_url: endpoints.product_ontology_base.clone(),
            check_exists: true,
            failure_policy: CheckFailurePolicy::default(),
        }
    }

    pub fn with_existence_check(mut self, check_exists: bool) -> Self {
        self.check_exists = check_exists;
        self
    }

    pub fn with_failure_policy(mut self, policy: CheckFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Class URL for a name, or `None` when nothing survives slugging
    pub fn class_url(&self, name: &str) -> Option<String> {
        let slug = product_ontology_slug(name);
        if slug.is_empty() {
            None
        } else {
            Some(format!("{}{}", self.base_url, slug))
        }
    }

    /// HEAD the URL and decide acceptance
    async fn confirm_exists(&self, name: &str, url: &str) -> bool {
        match self.http_client.head(url).send().await {
            Ok(response) => {
                let accepted = response.status().is_success();
                debug!(
                    entity = %name,
                    status = response.status().as_u16(),
                    accepted,
                    "ProductOntology existence check completed"
                );
                accepted
            }
            Err(e) => {
                let accepted = self.failure_policy == CheckFailurePolicy::AssumeValid;
                warn!(
                    entity = %name,
                    error = %e,
                    policy = ?self.failure_policy,
                    accepted,
                    "ProductOntology existence check failed"
                );
                accepted
            }
        }
    }
}

#[async_trait]
impl EntitySource for ProductOntologyClient {
    type Output = ProductOntologyMatch;

    fn kind(&self) -> SourceKind {
        SourceKind::ProductOntology
    }

    async fn lookup(
        &self,
        name: &str,
        _ctx: &LookupContext,
    ) -> Result<Option<ProductOntologyMatch>, SourceError> {
        let Some(url) = self.class_url(name) else {
            debug!(entity = %name, "ProductOntology: empty slug");
            return Ok(None);
        };

        if self.check_exists && !self.confirm_exists(name, &url).await {
            return Ok(None);
        }

        Ok(Some(ProductOntologyMatch { url }))
    }
}
