//! Discord REST session.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::DiscordConfig;
use crate::discord::types::{
    Channel, CreateChannel, CreateMessage, CurrentUser, Embed, Guild, Message, TEXT_CHANNEL,
};
use crate::error::{RelayError, Result};

/// An authenticated connection to the Discord API.
///
/// Created by [`DiscordSession::connect`], which only returns once the
/// bot identity has been confirmed. The session is consumed by
/// [`DiscordSession::close`] at the end of a run. Teardown lives in `Drop`,
/// so an early return through `?` closes the session the same way.
pub struct DiscordSession {
    client: Client,
    api_base_url: String,
    authorization: String,
    user: CurrentUser,
}

impl DiscordSession {
    /// Log in with the bot token and wait until the API accepts it.
    pub async fn connect(config: &DiscordConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RelayError::Login(format!("failed to create HTTP client: {}", e)))?;

        let api_base_url = config.api_base_url.trim_end_matches('/').to_string();
        let authorization = format!("Bot {}", config.token);

        let request = client
            .get(format!("{}/users/@me", api_base_url))
            .header(AUTHORIZATION, &authorization);
        let user: CurrentUser = execute(request).await.map_err(RelayError::Login)?;

        info!("Logged in as: {}", user.username);

        Ok(Self {
            client,
            api_base_url,
            authorization,
            user,
        })
    }

    /// Look up a guild by id.
    pub async fn guild(&self, guild_id: &str) -> Result<Guild> {
        let request = self.get(&format!("guilds/{}", guild_id));
        execute(request).await.map_err(|e| {
            RelayError::Channel(format!("server {} could not be resolved: {}", guild_id, e))
        })
    }

    /// List all channels of a guild.
    pub async fn guild_channels(&self, guild_id: &str) -> Result<Vec<Channel>> {
        let request = self.get(&format!("guilds/{}/channels", guild_id));
        execute(request).await.map_err(|e| {
            RelayError::Channel(format!(
                "channels of server {} could not be listed: {}",
                guild_id, e
            ))
        })
    }

    /// Create a text channel in a guild.
    pub async fn create_text_channel(&self, guild_id: &str, name: &str) -> Result<Channel> {
        let body = CreateChannel {
            name: name.to_string(),
            kind: TEXT_CHANNEL,
        };
        let request = self
            .post(&format!("guilds/{}/channels", guild_id))
            .json(&body);
        execute(request).await.map_err(|e| {
            RelayError::Channel(format!("channel '{}' could not be created: {}", name, e))
        })
    }

    /// Post an embed to a channel.
    pub async fn send_embed(&self, channel_id: &str, embed: Embed) -> Result<Message> {
        let body = CreateMessage {
            embeds: vec![embed],
        };
        let request = self
            .post(&format!("channels/{}/messages", channel_id))
            .json(&body);
        execute(request).await.map_err(|e| {
            RelayError::Send(format!("message to channel {} failed: {}", channel_id, e))
        })
    }

    /// End the session.
    ///
    /// Equivalent to dropping it; spelled out at the end of a run.
    pub fn close(self) {}

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}/{}", self.api_base_url, path))
            .header(AUTHORIZATION, &self.authorization)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}/{}", self.api_base_url, path))
            .header(AUTHORIZATION, &self.authorization)
    }
}

impl Drop for DiscordSession {
    fn drop(&mut self) {
        // Pooled connections are released with the client.
        debug!("Discord session for {} closed", self.user.username);
    }
}

/// Send a request and decode a JSON response, describing failures as text.
async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> std::result::Result<T, String> {
    let response = request.send().await.map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(format!("HTTP {}: {}", status, body.trim()));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| format!("invalid response: {}", e))
}
