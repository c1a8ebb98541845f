//! HTTP client for the selfoss REST API.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::{Credentials, SelfossConfig};
use crate::datetime::format_watermark;
use crate::error::{RelayError, Result};
use crate::selfoss::types::{Cursor, Item};

/// User agent string for selfoss requests.
const USER_AGENT: &str = concat!("selfoss-discord/", env!("CARGO_PKG_VERSION"));

/// Client for one selfoss instance.
pub struct SelfossClient {
    client: Client,
    /// Base URL, always ending in `/` so that `join` appends.
    base_url: Url,
    page_size: usize,
}

impl SelfossClient {
    /// Create a client from configuration.
    ///
    /// When `verify_ssl` is off, invalid and self-signed certificates are
    /// accepted.
    pub fn new(config: &SelfossConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| RelayError::Config(format!("invalid selfoss URL: {}", e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| RelayError::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            page_size: config.page_size,
        })
    }

    /// Base URL without the trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Build the item listing URL for a cursor.
    pub fn items_url(&self, cursor: &Cursor) -> Result<Url> {
        let mut url = self.endpoint("items")?;
        {
            let mut query = url.query_pairs_mut();
            match cursor {
                Cursor::UpdatedSince(watermark) => {
                    query.append_pair("updatedsince", &format_watermark(watermark));
                }
                Cursor::Unread => {
                    query.append_pair("type", "unread");
                }
            }
            query.append_pair("items", &self.page_size.to_string());
        }
        Ok(url)
    }

    /// Fetch one page of items for the cursor.
    ///
    /// There is no pagination: at most `page_size` items are returned.
    pub async fn fetch_items(&self, cursor: &Cursor) -> Result<Vec<Item>> {
        let url = self.items_url(cursor)?;
        debug!("Fetching items: {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RelayError::Fetch(format!("failed to fetch items: {}", e)))?;

        if !response.status().is_success() {
            return Err(RelayError::Fetch(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::Fetch(format!("failed to read response: {}", e)))?;

        let items: Vec<Item> = serde_json::from_slice(&bytes)
            .map_err(|e| RelayError::Fetch(format!("invalid item list: {}", e)))?;

        debug!("Fetched {} item(s)", items.len());
        Ok(items)
    }

    /// Mark a single item as read.
    pub async fn mark_as_read(&self, id: u64, credentials: &Credentials) -> Result<()> {
        let url = self.endpoint("mark")?;
        let id = id.to_string();
        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("ids", id.as_str()),
        ];

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| RelayError::Ack(format!("failed to mark item {}: {}", id, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(RelayError::Ack(format!("HTTP {}: {}", status, body.trim())))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| RelayError::Config(format!("invalid selfoss URL: {}", e)))
    }
}
