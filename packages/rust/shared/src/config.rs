//! Application configuration for SiteScout.
//!
//! User config lives at `~/.sitescout/sitescout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SiteScoutError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sitescout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sitescout";

/// Instruction sent to the semantic extractor with every page.
const DEFAULT_PROMPT: &str = "Extract the company's products, services, and founder name(s). \
For products and services, only include entries written in English. \
Only list a person under founders if their role on the page mentions the word founder; \
names shown next to a founder caption in images count. \
Only include founders of this company, not of other companies. \
Respond with a JSON object with the keys \"products\", \"services\" and \"founders\", \
each an array of strings.";

// ---------------------------------------------------------------------------
// Config structs (matching sitescout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Seed URLs to process when none are given on the command line.
    #[serde(default)]
    pub domains: Vec<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// OpenRouter settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Semantic extraction settings.
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Noise filter thresholds.
    #[serde(default)]
    pub filter: FilterRules,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Linked pages processed concurrently within one domain.
    #[serde(default = "default_link_concurrency")]
    pub link_concurrency: u32,

    /// Domains processed concurrently.
    #[serde(default = "default_domain_concurrency")]
    pub domain_concurrency: u32,

    /// Per-request timeout for page fetches.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Per-page timeout for the semantic extractor.
    #[serde(default = "default_extract_timeout")]
    pub extract_timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            link_concurrency: default_link_concurrency(),
            domain_concurrency: default_domain_concurrency(),
            fetch_timeout_secs: default_fetch_timeout(),
            extract_timeout_secs: default_extract_timeout(),
        }
    }
}

fn default_link_concurrency() -> u32 {
    4
}
fn default_domain_concurrency() -> u32 {
    2
}
fn default_fetch_timeout() -> u64 {
    30
}
fn default_extract_timeout() -> u64 {
    120
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for extraction.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            default_model: default_model(),
            base_url: default_base_url(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}

/// `[extraction]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Fixed instruction describing what to extract.
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// Page text is truncated to this many characters before being sent.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.into()
}
fn default_max_content_chars() -> usize {
    12_000
}

/// `[filter]` section: thresholds applied before reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRules {
    /// Products/services shorter than this (in characters) are dropped.
    #[serde(default = "default_min_item_chars")]
    pub min_item_chars: usize,

    /// Products/services with more words than this are dropped.
    #[serde(default = "default_max_item_words")]
    pub max_item_words: usize,

    /// Founder entries with fewer words than this are dropped.
    #[serde(default = "default_min_founder_words")]
    pub min_founder_words: usize,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            min_item_chars: default_min_item_chars(),
            max_item_words: default_max_item_words(),
            min_founder_words: default_min_founder_words(),
        }
    }
}

fn default_min_item_chars() -> usize {
    3
}
fn default_max_item_words() -> usize {
    8
}
fn default_min_founder_words() -> usize {
    2
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration, merged from config file + CLI flags.
///
/// Built once at startup and handed to the orchestrator by value.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum linked pages in flight per domain.
    pub link_concurrency: usize,
    /// Maximum domains in flight.
    pub domain_concurrency: usize,
    /// Timeout for a single page fetch.
    pub fetch_timeout: Duration,
    /// Timeout for a single extractor call.
    pub extract_timeout: Duration,
    /// Noise filter thresholds.
    pub filter: FilterRules,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            link_concurrency: config.defaults.link_concurrency.max(1) as usize,
            domain_concurrency: config.defaults.domain_concurrency.max(1) as usize,
            fetch_timeout: Duration::from_secs(config.defaults.fetch_timeout_secs),
            extract_timeout: Duration::from_secs(config.defaults.extract_timeout_secs),
            filter: config.filter,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sitescout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SiteScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sitescout/sitescout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SiteScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SiteScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
/// An existing file is left alone.
pub fn init_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(SiteScoutError::config(format!(
            "{} already exists",
            path.display()
        )));
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| SiteScoutError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| SiteScoutError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| SiteScoutError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

/// Read the OpenRouter API key from the env var named in config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.openrouter.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(SiteScoutError::config(format!(
            "OpenRouter API key not found. Set the {var_name} environment variable, \
             or pass --heuristic-only to skip semantic extraction."
        ))),
    }
}

/// Validate seed URLs: each must parse as an absolute http(s) URL with a host.
pub fn parse_seeds(raw: &[String]) -> Result<Vec<Url>> {
    if raw.is_empty() {
        return Err(SiteScoutError::validation(
            "no seed domains given (pass URLs or set `domains` in the config file)",
        ));
    }

    raw.iter()
        .map(|s| {
            let url = Url::parse(s)
                .map_err(|e| SiteScoutError::validation(format!("invalid URL '{s}': {e}")))?;
            if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
                return Err(SiteScoutError::validation(format!(
                    "seed must be an absolute http(s) URL: {s}"
                )));
            }
            Ok(url)
        })
        .collect()
}
