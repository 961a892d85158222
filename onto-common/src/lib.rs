//! # Onto Common Library
//!
//! Shared code for the onto services including:
//! - Error type shared across crates
//! - TOML bootstrap configuration and root folder resolution
//! - Timestamp helpers used by persisted records

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
