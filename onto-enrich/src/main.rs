//! onto-enrich - entity enrichment command line
//!
//! Enriches entity names against Wikipedia, Wikidata, the Google Knowledge
//! Graph and ProductOntology and prints the results as JSON. Also maintains
//! the enrichment cache and the stored Knowledge Graph API key.

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use onto_common::config::{database_path, RootFolderResolver, TomlConfig};
use onto_enrich::{EnrichmentOptions, EntityType};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for onto-enrich
#[derive(Parser, Debug)]
#[command(name = "onto-enrich")]
#[command(about = "Entity enrichment against public knowledge sources")]
#[command(version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("ONTO_GIT_HASH"),
    ", built ",
    env!("ONTO_BUILD_DATE"),
    ")"
))]
struct Args {
    /// Root folder holding the cache database
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// TOML config file (defaults to the platform config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enrich entity names and print JSON
    Enrich(EnrichArgs),

    /// Cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Store the Knowledge Graph API key in the database
    SetKey {
        /// API key
        key: String,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Delete expired entries
    Purge,
    /// Print entry and hit counts
    Stats,
}

#[derive(ClapArgs, Debug)]
struct EnrichArgs {
    /// Entity names, enriched in order
    names: Vec<String>,

    /// Read additional names from a file, one per line
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Entity type attached to every result (e.g. Person, Organization)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    entity_type: Option<String>,

    #[arg(long)]
    no_wikipedia: bool,

    #[arg(long)]
    no_wikidata: bool,

    #[arg(long)]
    no_knowledge_graph: bool,

    #[arg(long)]
    no_product_ontology: bool,

    /// Adapter-backed enrichments allowed before the breaker trips
    #[arg(long)]
    max_entities: Option<usize>,

    /// Skip cache reads
    #[arg(long)]
    no_cache: bool,

    /// Skip cache writes
    #[arg(long)]
    no_cache_write: bool,

    /// Delay between adapter-backed enrichments (milliseconds)
    #[arg(long)]
    rate_limit_ms: Option<u64>,

    /// Print the batch summary alongside the results
    #[arg(long)]
    summary: bool,
}

impl EnrichArgs {
    /// CLI flags layered over the configured options
    fn apply_to(&self, mut options: EnrichmentOptions) -> EnrichmentOptions {
        if self.no_wikipedia {
            options.enable_wikipedia = false;
        }
        if self.no_wikidata {
            options.enable_wikidata = false;
        }
        if self.no_knowledge_graph {
            options.enable_knowledge_graph = false;
        }
        if self.no_product_ontology {
            options.enable_product_ontology = false;
        }
        if let Some(max) = self.max_entities {
            options.max_entities = max;
        }
        if self.no_cache {
            options.use_cache = false;
        }
        if self.no_cache_write {
            options.cache_results = false;
        }
        if let Some(ms) = self.rate_limit_ms {
            options.rate_limit_ms = ms;
        }
        options
    }

    fn collect_names(&self) -> Result<Vec<String>> {
        let mut names = self.names.clone();

        if let Some(path) = &self.file {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read names from {}", path.display()))?;
            names.extend(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        }

        if names.is_empty() {
            bail!("No entity names given (pass names or --file)");
        }
        Ok(names)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = match &args.config {
        Some(path) => TomlConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TomlConfig::load_or_default(),
    };

    // Logs go to stderr; stdout carries the JSON output
    let default_filter = format!("onto_enrich={}", toml_config.logging.level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let root_folder = RootFolderResolver::new(args.root_folder.clone(), &toml_config).resolve();
    let db_path = database_path(&root_folder);
    info!("Database: {}", db_path.display());

    let service = onto_enrich::bootstrap(&db_path, &toml_config)
        .await
        .context("Failed to initialize enrichment service")?;

    match args.command {
        Command::Enrich(enrich) => {
            let names = enrich.collect_names()?;
            let options = enrich.apply_to(service.options.clone());
            let entity_type = enrich
                .entity_type
                .as_deref()
                .map(|t| t.parse::<EntityType>().unwrap_or_default());

            let (mut results, summary) = service
                .orchestrator
                .enrich_entities_with_summary(&names, &options)
                .await;

            if let Some(entity_type) = entity_type {
                results = results
                    .into_iter()
                    .map(|entity| entity.with_entity_type(entity_type))
                    .collect();
            }

            let output = if enrich.summary {
                serde_json::json!({ "entities": results, "summary": summary })
            } else {
                serde_json::to_value(&results)?
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Cache { action } => match action {
            CacheAction::Purge => {
                let removed = service.cache.purge_expired().await?;
                println!("Removed {} expired entries", removed);
            }
            CacheAction::Stats => {
                let stats = service.cache.stats().await?;
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
        },
        Command::SetKey { key } => {
            if !onto_enrich::config::is_valid_key(&key) {
                bail!("API key must not be blank");
            }
            onto_enrich::db::settings::set_knowledge_graph_api_key(&service.db, key).await?;
            println!("Knowledge Graph API key stored");
        }
    }

    Ok(())
}
