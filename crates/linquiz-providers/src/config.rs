//! Configuration, credential lookup, and provider factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use linquiz_core::remediation::RemediationConfig;
use linquiz_core::traits::TextGenerator;

use crate::anthropic::AnthropicProvider;

/// Environment variable (and `.env` key) holding the API credential.
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Top-level linquiz configuration.
///
/// Note: Custom Debug impl masks the API key to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct LinquizConfig {
    /// API key; `${VAR}` references are expanded.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Override for the API base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model used for every remediation phase.
    #[serde(default = "default_model")]
    pub model: String,
    /// Where result records and generated documents are written.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Where the study guides live.
    #[serde(default = "default_guide_dir")]
    pub guide_dir: PathBuf,
    #[serde(default = "default_document_tokens")]
    pub review_max_tokens: u32,
    #[serde(default = "default_document_tokens")]
    pub supplement_max_tokens: u32,
    #[serde(default = "default_retest_tokens")]
    pub retest_max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl std::fmt::Debug for LinquizConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinquizConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("results_dir", &self.results_dir)
            .field("guide_dir", &self.guide_dir)
            .field("review_max_tokens", &self.review_max_tokens)
            .field("supplement_max_tokens", &self.supplement_max_tokens)
            .field("retest_max_tokens", &self.retest_max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}
fn default_results_dir() -> PathBuf {
    PathBuf::from("./results")
}
fn default_guide_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_document_tokens() -> u32 {
    4000
}
fn default_retest_tokens() -> u32 {
    2000
}
fn default_temperature() -> f64 {
    1.0
}

impl Default for LinquizConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: default_model(),
            results_dir: default_results_dir(),
            guide_dir: default_guide_dir(),
            review_max_tokens: default_document_tokens(),
            supplement_max_tokens: default_document_tokens(),
            retest_max_tokens: default_retest_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl LinquizConfig {
    /// Generation settings for the remediation pipeline.
    pub fn remediation(&self) -> RemediationConfig {
        RemediationConfig {
            model: self.model.clone(),
            review_max_tokens: self.review_max_tokens,
            supplement_max_tokens: self.supplement_max_tokens,
            retest_max_tokens: self.retest_max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `linquiz.toml` in the current directory
/// 2. `~/.config/linquiz/config.toml`
pub fn load_config() -> Result<LinquizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<LinquizConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("linquiz.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<LinquizConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => LinquizConfig::default(),
    };

    config.api_key = config.api_key.as_deref().map(resolve_env_vars);
    config.base_url = config.base_url.as_deref().map(resolve_env_vars);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("linquiz"))
}

/// Look up the API credential.
///
/// Order: the `ANTHROPIC_API_KEY` environment variable, the same key in
/// `./.env`, then `api_key` from the config file. Blank values count as
/// absent; `None` means the quiz runs without AI features.
pub fn resolve_api_key(config: &LinquizConfig) -> Option<String> {
    resolve_api_key_from(
        std::env::var(API_KEY_VAR).ok(),
        Path::new(".env"),
        config,
    )
}

/// [`resolve_api_key`] with the environment value and `.env` path given
/// explicitly.
pub fn resolve_api_key_from(
    env_value: Option<String>,
    env_file: &Path,
    config: &LinquizConfig,
) -> Option<String> {
    non_blank(env_value)
        .or_else(|| non_blank(read_env_file_key(env_file)))
        .or_else(|| non_blank(config.api_key.clone()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read the credential from a dotenv file without touching the process
/// environment.
fn read_env_file_key(path: &Path) -> Option<String> {
    let entries = match dotenv::from_path_iter(path) {
        Ok(entries) => entries,
        Err(_) => return None,
    };
    for entry in entries {
        match entry {
            Ok((key, value)) if key == API_KEY_VAR => return Some(value),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping malformed .env line");
            }
        }
    }
    None
}

/// Create a provider instance from its configuration.
pub fn create_provider(api_key: &str, config: &LinquizConfig) -> Box<dyn TextGenerator> {
    Box::new(AnthropicProvider::new(api_key, config.base_url.clone()))
}
