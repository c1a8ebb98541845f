//! Selfoss types.

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};

use crate::datetime::parse_item_timestamp;
use crate::Result;

/// Query strategy used to select candidate items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Items updated since the given watermark.
    UpdatedSince(DateTime<Tz>),
    /// Items selfoss still considers unread.
    Unread,
}

/// An item as returned by `GET /items`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Item {
    /// Item ID. Older selfoss versions send it as a string.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    /// Item title.
    #[serde(default)]
    pub title: String,
    /// Link to the original article.
    #[serde(default)]
    pub link: String,
    /// HTML body.
    #[serde(default)]
    pub content: String,
    /// Title of the source (feed) the item belongs to.
    #[serde(rename = "sourcetitle", default)]
    pub source_title: String,
    /// Favicon filename under `/favicons/`.
    #[serde(default)]
    pub icon: Option<String>,
    /// Raw publication time, with offset.
    pub datetime: String,
}

impl Item {
    /// Parse the publication time.
    pub fn published_at(&self) -> Result<DateTime<FixedOffset>> {
        parse_item_timestamp(&self.datetime)
    }

    /// Favicon filename, if the source has one.
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref().filter(|icon| !icon.is_empty())
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid item id: {}", text))),
    }
}
