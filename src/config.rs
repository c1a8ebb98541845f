//! Configuration module for selfoss-discord.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then environment variables (including a `.env` file), then CLI flags.
//! The result is a single [`Config`] that is passed by reference to every
//! stage of a run.

use serde::Deserialize;
use std::path::Path;

use crate::{RelayError, Result};

/// Selfoss aggregator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SelfossConfig {
    /// Base URL of the selfoss instance (e.g. `https://rss.example.org`).
    #[serde(default)]
    pub base_url: String,
    /// Verify the aggregator's TLS certificate.
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    /// Username for mark-as-read requests.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for mark-as-read requests.
    #[serde(default)]
    pub password: Option<String>,
    /// Maximum number of items requested per run.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
}

fn default_verify_ssl() -> bool {
    true
}

fn default_page_size() -> usize {
    200
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_total_timeout() -> u64 {
    30
}

impl Default for SelfossConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            verify_ssl: default_verify_ssl(),
            username: None,
            password: None,
            page_size: default_page_size(),
            connect_timeout_secs: default_connect_timeout(),
            total_timeout_secs: default_total_timeout(),
        }
    }
}

impl SelfossConfig {
    /// Credentials for mark-as-read, if both username and password are set.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

/// Basic credentials sent in the body of mark-as-read requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Discord configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token.
    #[serde(default)]
    pub token: String,
    /// Numeric identifier of the target server (guild).
    #[serde(default)]
    pub server_id: String,
    /// REST API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            server_id: String::new(),
            api_base_url: default_api_base_url(),
            timeout_secs: default_total_timeout(),
        }
    }
}

/// Watermark configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WatermarkConfig {
    /// File holding the last processed timestamp.
    ///
    /// When unset, items are selected by their unread flag instead.
    #[serde(default)]
    pub file: Option<String>,
    /// Timezone the watermark is stored and compared in (e.g. "Europe/Berlin").
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "Europe/Berlin".to_string()
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            file: None,
            timezone: default_timezone(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file, written in addition to stderr.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Selfoss configuration.
    #[serde(default)]
    pub selfoss: SelfossConfig,
    /// Discord configuration.
    #[serde(default)]
    pub discord: DiscordConfig,
    /// Watermark configuration.
    #[serde(default)]
    pub watermark: WatermarkConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(RelayError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| RelayError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DISCORD_TOKEN`, `DISCORD_SERVER_ID`, `DISCORD_API_BASE_URL`
    /// - `SELFOSS_BASE_URL`, `SELFOSS_USERNAME`, `SELFOSS_PASSWORD`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(token) = get("DISCORD_TOKEN") {
            self.discord.token = token;
        }
        if let Some(server_id) = get("DISCORD_SERVER_ID") {
            self.discord.server_id = server_id;
        }
        if let Some(api_base_url) = get("DISCORD_API_BASE_URL") {
            self.discord.api_base_url = api_base_url;
        }
        if let Some(base_url) = get("SELFOSS_BASE_URL") {
            self.selfoss.base_url = base_url;
        }
        if let Some(username) = get("SELFOSS_USERNAME") {
            self.selfoss.username = Some(username);
        }
        if let Some(password) = get("SELFOSS_PASSWORD") {
            self.selfoss.password = Some(password);
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the selfoss base URL is missing or not an http(s) URL
    /// - the Discord token is missing
    /// - the server id is missing or not numeric
    /// - the timezone is not a known IANA name
    pub fn validate(&self) -> Result<()> {
        if self.selfoss.base_url.is_empty() {
            return Err(RelayError::Config(
                "selfoss base URL is not set".to_string(),
            ));
        }
        let parsed = url::Url::parse(&self.selfoss.base_url)
            .map_err(|e| RelayError::Config(format!("invalid selfoss URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RelayError::Config(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }

        if self.discord.token.is_empty() {
            return Err(RelayError::Config(
                "Discord token is not set. \
                 Pass --token or set DISCORD_TOKEN in the environment or .env file."
                    .to_string(),
            ));
        }

        if self.discord.server_id.is_empty() {
            return Err(RelayError::Config(
                "Discord server id is not set. \
                 Pass --server-id or set DISCORD_SERVER_ID in the environment or .env file."
                    .to_string(),
            ));
        }
        if self.discord.server_id.parse::<u64>().is_err() {
            return Err(RelayError::Config(format!(
                "Discord server id must be numeric: {}",
                self.discord.server_id
            )));
        }

        crate::datetime::parse_timezone(&self.watermark.timezone)?;

        if self.selfoss.page_size == 0 {
            return Err(RelayError::Config("page_size must be at least 1".to_string()));
        }

        Ok(())
    }
}
