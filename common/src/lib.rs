/*!
common/src/lib.rs

Shared configuration types for oddpress.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader that merges a default file with an optional override file
- Resolution of the raw config into the explicit settings the pipeline is built from
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TARGET_COUNT: usize = 5;
pub const DEFAULT_PER_FEED_CAP: usize = 25;
pub const DEFAULT_DOMAIN_CAP: usize = 2;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 12;
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; WeirdnessBot/1.0; +https://github.com/)";
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const MODEL_ENV: &str = "OPENAI_MODEL";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_TOKENS: usize = 120;
pub const DEFAULT_TEMPERATURE: f32 = 0.6;
pub const DEFAULT_TEMPLATE_PATH: &str = "templates/index.html";
pub const DEFAULT_OUTPUT_PATH: &str = "site/index.html";

/// Feed source list. Same shape as a `sources.yaml` with an `rss:` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub rss: Vec<String>,
}

/// Selection limits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Number of posts on the rendered page (N)
    pub target_count: Option<usize>,
    /// Entries read from each feed (P)
    pub per_feed_cap: Option<usize>,
    /// Max picks per source domain before top-up (C)
    pub domain_cap: Option<usize>,
}

/// Politeness / fetching configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolitenessConfig {
    pub fetch_timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
    pub concurrency: Option<usize>,
}

/// Remote summarization endpoint (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

/// Where the page template lives and where the rendered page goes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub template_path: Option<String>,
    pub output_path: Option<String>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    pub selection: Option<SelectionConfig>,
    pub politeness: Option<PolitenessConfig>,
    pub llm: Option<LlmConfig>,
    pub output: Option<OutputConfig>,
}

/// The explicit configuration the selection pipeline is constructed with.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub feed_urls: Vec<String>,
    pub per_feed_cap: usize,
    pub domain_cap: usize,
    pub target_count: usize,
    /// `None` means summaries always use the deterministic fallback.
    pub summarizer_credential: Option<String>,
    pub model_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub concurrency: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub api_url: String,
    pub timeout_seconds: u64,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: DEFAULT_LLM_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub template_path: PathBuf,
    pub output_path: PathBuf,
}

/// Fully resolved settings. Environment lookups happen once, while building this.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub pipeline: PipelineSettings,
    pub fetch: FetchSettings,
    pub llm: LlmSettings,
    pub output: OutputSettings,
}

impl Config {
    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        if let Some(path) = default_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read default config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse default configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        if let Some(path) = override_path {
            if path.exists() {
                let data = tokio::fs::read_to_string(path).await
                    .with_context(|| format!("Failed to read override config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .context("Failed to parse override configuration")?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<Settings> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve using `env` for environment lookups, then validate.
    pub fn resolve_with<F>(&self, env: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let selection = self.selection.clone().unwrap_or_default();
        let politeness = self.politeness.clone().unwrap_or_default();
        let llm = self.llm.clone().unwrap_or_default();
        let output = self.output.clone().unwrap_or_default();

        let api_key_env = llm.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);
        let summarizer_credential = env(api_key_env)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let model_name = llm
            .model
            .clone()
            .or_else(|| env(MODEL_ENV).filter(|m| !m.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let feed_urls: Vec<String> = self
            .sources
            .rss
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();

        let settings = Settings {
            pipeline: PipelineSettings {
                feed_urls,
                per_feed_cap: selection.per_feed_cap.unwrap_or(DEFAULT_PER_FEED_CAP),
                domain_cap: selection.domain_cap.unwrap_or(DEFAULT_DOMAIN_CAP),
                target_count: selection.target_count.unwrap_or(DEFAULT_TARGET_COUNT),
                summarizer_credential,
                model_name,
            },
            fetch: FetchSettings {
                timeout_seconds: politeness
                    .fetch_timeout_seconds
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
                user_agent: politeness
                    .user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                concurrency: politeness.concurrency.unwrap_or(DEFAULT_FETCH_CONCURRENCY),
            },
            llm: LlmSettings {
                api_url: llm.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                timeout_seconds: llm.timeout_seconds.unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
                max_tokens: llm.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                temperature: llm.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            },
            output: OutputSettings {
                template_path: PathBuf::from(
                    output.template_path.as_deref().unwrap_or(DEFAULT_TEMPLATE_PATH),
                ),
                output_path: PathBuf::from(
                    output.output_path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH),
                ),
            },
        };

        settings.validate()?;
        Ok(settings)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.target_count == 0 {
            anyhow::bail!("selection.target_count must be at least 1");
        }
        if self.pipeline.domain_cap == 0 {
            anyhow::bail!("selection.domain_cap must be at least 1");
        }
        if self.pipeline.per_feed_cap == 0 {
            anyhow::bail!("selection.per_feed_cap must be at least 1");
        }
        if self.fetch.concurrency == 0 {
            anyhow::bail!("politeness.concurrency must be at least 1");
        }
        Ok(())
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
