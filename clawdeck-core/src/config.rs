//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/clawdeck/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/clawdeck/` (~/.config/clawdeck/)
//! - Data: `$XDG_DATA_HOME/clawdeck/` (~/.local/share/clawdeck/)
//! - State/Logs: `$XDG_STATE_HOME/clawdeck/` (~/.local/state/clawdeck/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Agent transcript locations
    #[serde(default)]
    pub agent: AgentConfig,

    /// Explicit activity store
    #[serde(default)]
    pub store: StoreConfig,

    /// Feed presentation settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Gateway client configuration (optional)
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Where the agent keeps its session transcripts.
#[derive(Debug, Deserialize, Default)]
pub struct AgentConfig {
    /// Directory holding per-session `.jsonl` transcripts
    pub sessions_dir: Option<PathBuf>,
    /// Fallback directory used when `sessions_dir` does not exist
    pub workspace_dir: Option<PathBuf>,
}

impl AgentConfig {
    fn default_sessions_dir() -> PathBuf {
        home_dir().join(".openclaw/agents/main/sessions")
    }

    fn default_workspace_dir() -> PathBuf {
        home_dir().join(".openclaw/workspace")
    }

    /// Resolve the directory to read transcripts from.
    ///
    /// Prefers the configured (or default) sessions directory when it exists,
    /// otherwise falls back to the workspace directory. A missing fallback is
    /// fine: readers degrade to empty results on unreadable directories.
    pub fn resolve_sessions_dir(&self) -> PathBuf {
        let sessions = self
            .sessions_dir
            .clone()
            .unwrap_or_else(Self::default_sessions_dir);
        if sessions.exists() {
            return sessions;
        }
        self.workspace_dir
            .clone()
            .unwrap_or_else(Self::default_workspace_dir)
    }
}

/// Which backend holds explicit activities.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Json,
    Sqlite,
}

/// Explicit activity store configuration
#[derive(Debug, Deserialize, Default)]
pub struct StoreConfig {
    /// Backend kind
    #[serde(default)]
    pub backend: StoreBackend,

    /// Override path for the store file (json: `activities.json`,
    /// sqlite: `activities.db`); defaults live under the data dir
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Resolve the store file path for the configured backend.
    pub fn resolve_path(&self) -> PathBuf {
        if let Some(p) = &self.path {
            return p.clone();
        }
        match self.backend {
            StoreBackend::Json => Config::data_dir().join("activities.json"),
            StoreBackend::Sqlite => Config::data_dir().join("activities.db"),
        }
    }
}

/// Feed presentation configuration
#[derive(Debug, Deserialize)]
pub struct FeedConfig {
    /// Default number of feed entries when the caller gives no limit
    #[serde(default = "default_feed_limit")]
    pub default_limit: usize,

    /// Seconds between re-polls in watch mode
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_limit: default_feed_limit(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_feed_limit() -> usize {
    50
}

fn default_poll_interval() -> u64 {
    15
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Agent gateway configuration
///
/// When enabled, clawdeck can invoke tools on the running agent through its
/// local gateway (wake messages, cron listing).
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Enable/disable gateway access
    #[serde(default)]
    pub enabled: bool,

    /// Gateway base URL
    #[serde(default = "default_gateway_url")]
    pub url: String,

    /// Bearer token for the gateway
    pub token: Option<String>,

    /// Session key to route invocations to
    #[serde(default = "default_session_key")]
    pub session_key: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_gateway_url(),
            token: None,
            session_key: default_session_key(),
            timeout_secs: default_gateway_timeout(),
        }
    }
}

impl GatewayConfig {
    /// Check if the gateway is properly configured and enabled
    pub fn is_ready(&self) -> bool {
        self.enabled && self.token.is_some()
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.token.is_none() {
            return Err(Error::Config(
                "gateway.token is required when gateway is enabled".to_string(),
            ));
        }
        if self.url.trim().is_empty() {
            return Err(Error::Config(
                "gateway.url must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_gateway_url() -> String {
    "http://localhost:18789".to_string()
}

fn default_session_key() -> String {
    "main".to_string()
}

fn default_gateway_timeout() -> u64 {
    10
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/clawdeck/config.toml` (~/.config/clawdeck/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("clawdeck").join("config.toml")
    }

    /// Returns the data directory path (for the explicit activity store)
    ///
    /// `$XDG_DATA_HOME/clawdeck/` (~/.local/share/clawdeck/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("clawdeck")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/clawdeck/` (~/.local/state/clawdeck/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("clawdeck")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/clawdeck/clawdeck.log` (~/.local/state/clawdeck/clawdeck.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("clawdeck.log")
    }
}
