//! Discord REST API payloads.

use serde::{Deserialize, Serialize};

/// Channel type of a guild text channel.
pub const TEXT_CHANNEL: u8 = 0;

/// The bot user returned by `GET /users/@me`.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub username: String,
}

/// A guild (server), as returned by `GET /guilds/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Guild {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A guild channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
}

impl Channel {
    /// Whether messages can be posted to this channel.
    pub fn is_text(&self) -> bool {
        self.kind == TEXT_CHANNEL
    }
}

/// A created message. Only the id is used.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
}

/// Body of `POST /guilds/{id}/channels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChannel {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
}

/// Body of `POST /channels/{id}/messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessage {
    pub embeds: Vec<Embed>,
}

/// A rich message embed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}
