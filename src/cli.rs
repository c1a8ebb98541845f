//! Command line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::Result;

/// Checks a selfoss instance and sends notification messages to Discord.
#[derive(Debug, Parser)]
#[command(name = "selfoss-discord", version, about)]
pub struct Cli {
    /// Selfoss instance to fetch data from (overrides SELFOSS_BASE_URL).
    pub selfoss: Option<String>,

    /// File to save the last run time in.
    ///
    /// Without it, unread items are fetched and, given credentials, marked
    /// as read after delivery.
    pub last_update_filename: Option<PathBuf>,

    /// Discord bot token (overrides DISCORD_TOKEN).
    #[arg(long)]
    pub token: Option<String>,

    /// Discord server id (overrides DISCORD_SERVER_ID).
    #[arg(long)]
    pub server_id: Option<String>,

    /// Accept invalid or self-signed TLS certificates from selfoss.
    #[arg(long)]
    pub disable_verify_ssl: bool,

    /// Selfoss username for marking items as read.
    #[arg(long)]
    pub username: Option<String>,

    /// Selfoss password for marking items as read.
    #[arg(long)]
    pub password: Option<String>,

    /// TOML configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Timezone the watermark is kept in (e.g. Europe/Berlin).
    #[arg(long)]
    pub timezone: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Build the run configuration.
    ///
    /// Precedence, lowest first: defaults, `--config` file, environment,
    /// command line.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        config.apply_env_overrides();
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply command line values on top of a configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(selfoss) = &self.selfoss {
            config.selfoss.base_url = selfoss.clone();
        }
        if let Some(file) = &self.last_update_filename {
            config.watermark.file = Some(file.to_string_lossy().into_owned());
        }
        if let Some(token) = &self.token {
            config.discord.token = token.clone();
        }
        if let Some(server_id) = &self.server_id {
            config.discord.server_id = server_id.clone();
        }
        if self.disable_verify_ssl {
            config.selfoss.verify_ssl = false;
        }
        if let Some(username) = &self.username {
            config.selfoss.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.selfoss.password = Some(password.clone());
        }
        if let Some(timezone) = &self.timezone {
            config.watermark.timezone = timezone.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}
