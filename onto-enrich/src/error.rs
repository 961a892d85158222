//! Error types for onto-enrich
//!
//! Batch enrichment itself never fails: per-source and per-entity errors are
//! recovered into "no match" and placeholder entities. `EnrichError` covers
//! setup (database, configuration, HTTP client) and the per-entity failures
//! the orchestrator logs before substituting a placeholder.

use crate::sources::SourceError;
use thiserror::Error;

/// onto-enrich error type
#[derive(Debug, Error)]
pub enum EnrichError {
    /// onto-common error (database, config, I/O)
    #[error(transparent)]
    Common(#[from] onto_common::Error),

    /// Source client construction failed
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Entity pipeline panicked
    #[error("Enrichment of '{entity}' panicked: {message}")]
    EntityPanicked { entity: String, message: String },
}

/// Result alias for onto-enrich
pub type Result<T> = std::result::Result<T, EnrichError>;

impl EnrichError {
    /// Build from a `catch_unwind` payload
    pub fn from_panic(entity: &str, payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        EnrichError::EntityPanicked {
            entity: entity.to_string(),
            message,
        }
    }
}
