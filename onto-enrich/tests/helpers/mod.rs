//! Test Helper Utilities
//!
//! Shared utilities for testing onto-enrich

#![allow(dead_code)]

pub mod db_utils;
pub mod fake_web;

pub use db_utils::{create_test_cache, create_test_db};
pub use fake_web::FakeWeb;

use onto_enrich::EnrichmentOptions;

/// Default options without pacing delays
pub fn fast_options() -> EnrichmentOptions {
    EnrichmentOptions {
        rate_limit_ms: 0,
        ..EnrichmentOptions::default()
    }
}
