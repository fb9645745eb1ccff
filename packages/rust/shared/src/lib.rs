//! Shared types, error model, and configuration for SiteScout.
//!
//! This crate is the foundation depended on by all other SiteScout crates.
//! It provides:
//! - [`SiteScoutError`]: the unified error type
//! - Extraction types ([`Fragment`], [`ExtractionResult`], [`Category`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], [`FilterRules`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ExtractionConfig, FilterRules, OpenRouterConfig, PipelineConfig,
    config_dir, config_file_path, init_config, init_config_at, load_config, load_config_from,
    parse_seeds, resolve_api_key,
};
pub use error::{Result, SiteScoutError};
pub use types::{Category, ExtractionResult, Fragment};
