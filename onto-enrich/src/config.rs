//! Configuration resolution for onto-enrich
//!
//! Knowledge Graph credential: Database → ENV → TOML. A missing credential
//! is not an error; the graph client then produces search links only.
//!
//! Enrichment options and source tuning come from the TOML `[enrichment]`
//! table, with per-field defaults.

use crate::sources::{CheckFailurePolicy, SourceConfig, SourceEndpoints};
use crate::types::EnrichmentOptions;
use onto_common::config::TomlConfig;
use onto_common::{Error, Result};
use serde::Deserialize;
use sqlx::{Pool, Sqlite};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding the Knowledge Graph API key
pub const KNOWLEDGE_GRAPH_KEY_ENV: &str = "ONTO_KNOWLEDGE_GRAPH_API_KEY";

/// Resolve Knowledge Graph API key from 3-tier configuration
///
/// **Priority:** Database → ENV → TOML
pub async fn resolve_knowledge_graph_api_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
) -> Result<Option<String>> {
    let db_key = crate::db::settings::get_knowledge_graph_api_key(db).await?;
    let env_key = std::env::var(KNOWLEDGE_GRAPH_KEY_ENV).ok();
    let toml_key = toml_config.knowledge_graph_api_key.clone();

    Ok(pick_api_key(db_key, env_key, toml_key))
}

/// Highest-priority valid key among the three tiers
pub fn pick_api_key(
    db_key: Option<String>,
    env_key: Option<String>,
    toml_key: Option<String>,
) -> Option<String> {
    let tiers = [
        ("database", db_key.filter(|k| is_valid_key(k))),
        ("environment", env_key.filter(|k| is_valid_key(k))),
        ("TOML", toml_key.filter(|k| is_valid_key(k))),
    ];

    let present: Vec<&str> = tiers
        .iter()
        .filter(|(_, key)| key.is_some())
        .map(|(source, _)| *source)
        .collect();

    if present.len() > 1 {
        warn!(
            "Knowledge Graph API key found in multiple sources: {}. Using {} (highest priority).",
            present.join(", "),
            present[0]
        );
    }

    for (source, key) in tiers {
        if let Some(key) = key {
            info!("Knowledge Graph API key loaded from {}", source);
            return Some(key);
        }
    }

    info!(
        "Knowledge Graph API key not configured; graph lookups fall back to search links \
         (set {} or knowledge_graph_api_key in TOML)",
        KNOWLEDGE_GRAPH_KEY_ENV
    );
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Enrichment options from the `[enrichment]` table
pub fn load_enrichment_options(toml_config: &TomlConfig) -> Result<EnrichmentOptions> {
    toml::Value::Table(toml_config.enrichment.clone())
        .try_into()
        .map_err(|e| Error::Config(format!("Invalid [enrichment] section: {}", e)))
}

/// Source tuning keys accepted in the `[enrichment]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct SourceTuning {
    timeout_secs: u64,
    check_product_ontology: bool,
    check_failure_policy: CheckFailurePolicy,
}

impl Default for SourceTuning {
    fn default() -> Self {
        Self {
            timeout_secs: crate::sources::DEFAULT_TIMEOUT.as_secs(),
            check_product_ontology: true,
            check_failure_policy: CheckFailurePolicy::default(),
        }
    }
}

/// Source construction settings from the `[enrichment]` table
pub fn load_source_config(
    toml_config: &TomlConfig,
    knowledge_graph_api_key: Option<String>,
) -> Result<SourceConfig> {
    let tuning: SourceTuning = toml::Value::Table(toml_config.enrichment.clone())
        .try_into()
        .map_err(|e| Error::Config(format!("Invalid [enrichment] section: {}", e)))?;

    if tuning.timeout_secs == 0 {
        return Err(Error::Config("timeout_secs must be greater than zero".to_string()));
    }

    Ok(SourceConfig {
        endpoints: SourceEndpoints::default(),
        timeout: Duration::from_secs(tuning.timeout_secs),
        knowledge_graph_api_key,
        check_product_ontology: tuning.check_product_ontology,
        check_failure_policy: tuning.check_failure_policy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toml(content: &str) -> TomlConfig {
        TomlConfig::from_toml_str(content).unwrap()
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("  \t"));
    }

    #[test]
    fn test_pick_api_key_priority() {
        let key = pick_api_key(
            Some("db".to_string()),
            Some("env".to_string()),
            Some("toml".to_string()),
        );
        assert_eq!(key.as_deref(), Some("db"));

        let key = pick_api_key(Some(" ".to_string()), Some("env".to_string()), None);
        assert_eq!(key.as_deref(), Some("env"));

        let key = pick_api_key(None, None, Some("toml".to_string()));
        assert_eq!(key.as_deref(), Some("toml"));

        assert_eq!(pick_api_key(None, Some(String::new()), None), None);
    }

    #[test]
    fn test_enrichment_options_default_without_table() {
        let options = load_enrichment_options(&TomlConfig::default()).unwrap();
        assert_eq!(options, EnrichmentOptions::default());
    }

    #[test]
    fn test_enrichment_options_from_table() {
        let config = toml(
            r#"
            [enrichment]
            max_entities = 5
            enable_knowledge_graph = false
            rate_limit_ms = 0
            timeout_secs = 3
            "#,
        );

        let options = load_enrichment_options(&config).unwrap();
        assert_eq!(options.max_entities, 5);
        assert!(!options.enable_knowledge_graph);
        assert!(options.enable_wikipedia);
        assert_eq!(options.rate_limit_ms, 0);
    }

    #[test]
    fn test_enrichment_options_type_error() {
        let config = toml("[enrichment]\nmax_entities = \"lots\"");
        assert!(matches!(load_enrichment_options(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_source_config_tuning() {
        let config = toml(
            r#"
            [enrichment]
            timeout_secs = 3
            check_failure_policy = "reject"
            "#,
        );

        let sources = load_source_config(&config, Some("key".to_string())).unwrap();
        assert_eq!(sources.timeout, Duration::from_secs(3));
        assert_eq!(sources.check_failure_policy, CheckFailurePolicy::Reject);
        assert!(sources.check_product_ontology);
        assert_eq!(sources.knowledge_graph_api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_source_config_rejects_zero_timeout() {
        let config = toml("[enrichment]\ntimeout_secs = 0");
        assert!(load_source_config(&config, None).is_err());
    }
}
