use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::graph::UserId;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub vk: VkConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// VK API connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct VkConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Name of the environment variable holding the access token
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VkConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            access_token_env: default_access_token_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Crawl pacing and failure policy
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Minimum gap between the starts of two friends.get calls
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Extra attempts for retryable failures (0 = no retry)
    #[serde(default)]
    pub max_retries: usize,
    /// Persist the partial graph after this many fetched friends (0 = only at the end)
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,
    /// Abort the whole crawl on the first failed friend instead of recording an empty list
    #[serde(default)]
    pub fail_fast: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
            max_retries: 0,
            checkpoint_every: default_checkpoint_every(),
            fail_fast: false,
        }
    }
}

impl CrawlConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// Durable graph location
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_graph_path")]
    pub path: PathBuf,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            path: default_graph_path(),
        }
    }
}

/// Friend chain printed by the default report when no ids are given on the command line
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub start: Option<UserId>,
    #[serde(default)]
    pub end: Option<UserId>,
}

impl ReportConfig {
    /// Pick the chain endpoints: command-line ids win over configured ones.
    ///
    /// Returns `None` when either end is missing from both.
    pub fn endpoints(&self, start: Option<UserId>, end: Option<UserId>) -> Option<(UserId, UserId)> {
        Some((start.or(self.start)?, end.or(self.end)?))
    }
}

fn default_base_url() -> String {
    "https://api.vk.com/method/".to_string()
}

fn default_api_version() -> String {
    "5.199".to_string()
}

fn default_access_token_env() -> String {
    "VK_ACCESS_TOKEN".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_request_delay_ms() -> u64 {
    // VK allows three requests per second for user tokens
    333
}

fn default_checkpoint_every() -> usize {
    25
}

fn default_graph_path() -> PathBuf {
    PathBuf::from("graph.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in FRIENDGRAPH_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("FRIENDGRAPH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        Self::from_file(&config_path)
    }

    /// Like [`Config::load`], but a missing ./config.toml yields the built-in defaults.
    ///
    /// A path named by FRIENDGRAPH_CONFIG must still exist.
    pub fn load_or_default() -> Result<Self> {
        let _ = dotenv::dotenv();

        let explicit = std::env::var_os("FRIENDGRAPH_CONFIG").map(PathBuf::from);
        Self::from_optional_file(explicit, Path::new("config.toml"))
    }

    fn from_optional_file(explicit: Option<PathBuf>, fallback: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(&path),
            None if fallback.exists() => Self::from_file(fallback),
            None => Self::from_toml_str(""),
        }
    }

    /// Parse and validate a specific config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&config_str)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(text).context("Failed to parse config TOML")?;

        if !config.vk.base_url.is_empty() && !config.vk.base_url.ends_with('/') {
            config.vk.base_url.push('/');
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.vk.base_url.trim().is_empty() {
            anyhow::bail!("vk.base_url must not be empty");
        }

        if self.vk.api_version.trim().is_empty() {
            anyhow::bail!("vk.api_version must not be empty");
        }

        if self.vk.timeout_secs == 0 {
            anyhow::bail!("vk.timeout_secs must be greater than 0");
        }

        if self.vk.access_token_env.trim().is_empty() {
            anyhow::bail!("vk.access_token_env must name an environment variable");
        }

        if self.graph.path.as_os_str().is_empty() {
            anyhow::bail!("graph.path must not be empty");
        }

        for (key, id) in [("report.start", self.report.start), ("report.end", self.report.end)] {
            if let Some(id) = id.filter(|&id| id < 0) {
                anyhow::bail!("{} must not be negative: {}", key, id);
            }
        }

        Ok(())
    }

    /// Read the VK access token from the configured environment variable.
    ///
    /// Only crawling needs a token; analysis of a saved graph does not.
    pub fn access_token(&self) -> Result<String> {
        std::env::var(&self.vk.access_token_env).with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with your VK access token.",
                self.vk.access_token_env
            )
        })
    }

    /// Get the durable graph path
    pub fn graph_path(&self) -> &Path {
        &self.graph.path
    }
}
