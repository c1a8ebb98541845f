//! Turning selfoss items into Discord embeds.

use chrono_tz::Tz;
use scraper::Html;

use crate::datetime::{format_local, trim_fraction};
use crate::discord::{Embed, EmbedAuthor, EmbedFooter, EmbedImage};
use crate::selfoss::Item;
use crate::Result;

/// Discord's hard limit on message length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Discord's limit on embed titles, in characters.
pub const MAX_TITLE_CHARS: usize = 256;

/// How the footer timestamp is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterStyle {
    /// Item time converted to the timezone and formatted for display.
    Local(Tz),
    /// The timestamp as selfoss sent it, minus fractional seconds.
    Raw,
}

/// Everything needed to render an item, fixed for a whole run.
#[derive(Debug, Clone)]
pub struct MessageFormat {
    /// Selfoss base URL, used for favicon thumbnails.
    pub base_url: String,
    pub footer: FooterStyle,
}

impl MessageFormat {
    pub fn new(base_url: impl Into<String>, footer: FooterStyle) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            footer,
        }
    }

    /// Build the embed for an item.
    pub fn build(&self, item: &Item) -> Result<Embed> {
        let footer = match self.footer {
            FooterStyle::Local(tz) => format_local(&item.published_at()?, &tz),
            FooterStyle::Raw => trim_fraction(&item.datetime),
        };

        let description = message_text(&item.content);

        Ok(Embed {
            title: non_empty(truncate_chars(&item.title, MAX_TITLE_CHARS)),
            url: non_empty(item.link.clone()),
            description: non_empty(description),
            author: non_empty(item.source_title.clone()).map(|name| EmbedAuthor { name }),
            thumbnail: item.icon().map(|icon| EmbedImage {
                url: format!("{}/favicons/{}", self.base_url, icon),
            }),
            footer: Some(EmbedFooter { text: footer }),
        })
    }
}

/// Channel name for a source: lowercased, spaces replaced by hyphens.
///
/// No other character is touched.
pub fn channel_name(source_title: &str) -> String {
    source_title.to_lowercase().replace(' ', "-")
}

/// Plain message text for an item body.
///
/// Tags are stripped, double newlines collapsed and the result truncated
/// to fit a Discord message.
pub fn message_text(html: &str) -> String {
    let text = html_to_text(html).replace("\n\n", "\n");
    truncate_content(&text)
}

/// Truncate text longer than [`MAX_MESSAGE_CHARS`].
///
/// Over-long text is cut to `MAX_MESSAGE_CHARS - 1` characters, one short
/// of the limit. Text at or under the limit is returned unchanged.
pub fn truncate_content(text: &str) -> String {
    if text.chars().count() > MAX_MESSAGE_CHARS {
        text.chars().take(MAX_MESSAGE_CHARS - 1).collect()
    } else {
        text.to_string()
    }
}

/// Extract the text of an HTML fragment.
///
/// All text nodes are concatenated in document order with entities
/// decoded. Comments and attributes are dropped and source whitespace is
/// kept as is.
pub fn html_to_text(html: &str) -> String {
    Html::parse_fragment(html)
        .root_element()
        .text()
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
