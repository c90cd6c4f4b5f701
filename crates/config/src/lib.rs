//! Configuration management for schemaprobe
//!
//! Loads and saves the reasoning, probe, discovery, server and logging
//! settings from `~/.schemaprobe/config.json`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir};

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Errors in configuration handling
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Reasoning collaborator (chat-completions endpoint) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Force (or forbid) strict user/assistant alternation. Derived from the
    /// model name when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternating_roles: Option<bool>,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            alternating_roles: None,
        }
    }
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

/// Probe transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

/// Defaults applied to discovery requests that leave them out
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryDefaults {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for DiscoveryDefaults {
    fn default() -> Self {
        Self {
            method: default_method(),
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_max_iterations() -> u32 {
    10
}

/// Discovery service bind settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_to_file")]
    pub to_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            to_file: default_to_file(),
        }
    }
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_to_file() -> bool {
    true
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub reasoning: ReasoningConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub discovery: DiscoveryDefaults,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from specific location
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("◆ no config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("◆ reading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("◆ writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Reasoning API key: config file first, then `DEEPSEEK_API_KEY`
    pub fn api_key(&self) -> Option<String> {
        let key = self.reasoning.api_key.trim();
        if !key.is_empty() {
            return Some(key.to_string());
        }

        std::env::var(API_KEY_ENV)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    /// Reasoning endpoint base, if overridden
    pub fn api_base(&self) -> Option<String> {
        self.reasoning
            .api_base
            .as_ref()
            .filter(|b| !b.is_empty())
            .cloned()
    }

    pub fn model(&self) -> String {
        self.reasoning.model.clone()
    }

    /// Whether the configured model needs strict role alternation
    pub fn alternating_roles(&self) -> bool {
        self.reasoning.alternating_roles.unwrap_or_else(|| {
            let model = self.reasoning.model.to_lowercase();
            model.contains("reasoner") || model.contains("-r1")
        })
    }

    /// Log directory with `~` expanded
    pub fn log_dir(&self) -> PathBuf {
        let path = &self.logging.dir;
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        } else if path == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
        PathBuf::from(path)
    }

    /// Socket address for the discovery service
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Write a default config if none exists, then load it
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("◆ config already present at {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("◆ config written to {:?}", config_path);
    }

    Config::load().await
}
