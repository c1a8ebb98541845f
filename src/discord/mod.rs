//! Discord delivery sink.
//!
//! A thin REST client covering what the relay needs: log in, resolve a
//! guild, list and create text channels, and post embeds.

pub mod client;
pub mod types;

pub use client::DiscordSession;
pub use types::{Channel, CurrentUser, Embed, EmbedAuthor, EmbedFooter, EmbedImage, Guild};
