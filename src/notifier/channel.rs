//! Per-source channel resolution.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::discord::DiscordSession;
use crate::notifier::message::channel_name;
use crate::Result;

/// Maps source titles to text channels of one guild, creating missing ones.
#[derive(Debug)]
pub struct ChannelResolver {
    guild_id: String,
    /// Channel name to channel id.
    channels: HashMap<String, String>,
}

impl ChannelResolver {
    /// Resolve the guild and cache its existing text channels.
    ///
    /// Fails with a channel error if the guild cannot be resolved; the
    /// server id is fixed for the run, so nothing could be delivered.
    pub async fn load(session: &DiscordSession, guild_id: &str) -> Result<Self> {
        let guild = session.guild(guild_id).await?;
        debug!("Resolved server {} ({})", guild.name, guild.id);

        let mut channels = HashMap::new();
        for channel in session.guild_channels(guild_id).await? {
            if channel.is_text() {
                // First match wins when names are duplicated.
                channels.entry(channel.name).or_insert(channel.id);
            }
        }
        debug!("Server {} has {} text channel(s)", guild_id, channels.len());

        Ok(Self {
            guild_id: guild_id.to_string(),
            channels,
        })
    }

    /// Channel id for a source, creating the channel on first use.
    pub async fn resolve(&mut self, session: &DiscordSession, source_title: &str) -> Result<String> {
        let name = channel_name(source_title);
        if let Some(id) = self.channels.get(&name) {
            return Ok(id.clone());
        }

        let channel = session.create_text_channel(&self.guild_id, &name).await?;
        info!("Created channel #{} for source {}", name, source_title);
        self.channels.insert(name, channel.id.clone());
        Ok(channel.id)
    }
}
