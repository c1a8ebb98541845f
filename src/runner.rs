//! One relay run: fetch, filter, deliver, then acknowledge or advance.
//!
//! The run is a single linear sequence of awaited steps. The Discord session
//! is owned here and closed on both the success and the failure path of
//! delivery.

use chrono_tz::Tz;
use tracing::{debug, info};

use crate::config::Config;
use crate::datetime::parse_timezone;
use crate::discord::DiscordSession;
use crate::notifier::{acknowledge, notify, AckReport, ChannelResolver, FooterStyle, MessageFormat};
use crate::selfoss::{Cursor, Item, SelfossClient};
use crate::watermark::{select_new, Selection, WatermarkStore};
use crate::Result;

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing new since the last run; Discord was not contacted.
    NothingNew,
    /// Items were delivered.
    Delivered {
        /// Number of messages sent.
        sent: usize,
        /// Acknowledgement result, when mark-as-read ran.
        acknowledged: Option<AckReport>,
    },
}

/// Items picked for delivery, together with the cursor state that picked them.
enum Batch {
    /// Selected against a persisted watermark.
    Watermark {
        store: WatermarkStore,
        selection: Selection,
    },
    /// Selected by selfoss' unread flag.
    Unread { items: Vec<Item> },
}

impl Batch {
    fn items(&self) -> &[Item] {
        match self {
            Batch::Watermark { selection, .. } => &selection.items,
            Batch::Unread { items } => items,
        }
    }

    fn footer_style(&self, tz: Tz) -> FooterStyle {
        match self {
            Batch::Watermark { .. } => FooterStyle::Local(tz),
            Batch::Unread { .. } => FooterStyle::Raw,
        }
    }
}

/// Run the relay once with the given configuration.
pub async fn run(config: &Config) -> Result<RunOutcome> {
    let tz = parse_timezone(&config.watermark.timezone)?;
    let selfoss = SelfossClient::new(&config.selfoss)?;

    let batch = match config.watermark.file.as_deref() {
        Some(file) => {
            let store = WatermarkStore::new(file, tz);
            let watermark = store.load_or_default()?;
            debug!("Fetching items updated since {}", watermark);

            let fetched = selfoss.fetch_items(&Cursor::UpdatedSince(watermark)).await?;
            let selection = select_new(&fetched, &watermark)?;
            Batch::Watermark { store, selection }
        }
        None => {
            debug!("Fetching unread items");
            let items = selfoss.fetch_items(&Cursor::Unread).await?;
            Batch::Unread { items }
        }
    };

    let items = batch.items();
    if items.is_empty() {
        debug!("No new items");
        return Ok(RunOutcome::NothingNew);
    }
    info!("Found {} new item(s)", items.len());

    let format = MessageFormat::new(selfoss.base_url(), batch.footer_style(tz));
    let session = DiscordSession::connect(&config.discord).await?;
    let delivered = deliver(&session, &config.discord.server_id, items, &format).await;
    session.close();
    let sent = delivered?;

    let acknowledged = match &batch {
        Batch::Watermark { store, selection } => {
            if store.advance(selection)? {
                info!(
                    "Watermark advanced to {} in {}",
                    selection.watermark,
                    store.path().display()
                );
            }
            None
        }
        Batch::Unread { items } => match config.selfoss.credentials() {
            Some(credentials) => {
                let report = acknowledge(&selfoss, items, &credentials).await;
                info!("Marked {} of {} item(s) as read", report.acknowledged, items.len());
                Some(report)
            }
            None => None,
        },
    };

    Ok(RunOutcome::Delivered { sent, acknowledged })
}

async fn deliver(
    session: &DiscordSession,
    guild_id: &str,
    items: &[Item],
    format: &MessageFormat,
) -> Result<usize> {
    let mut resolver = ChannelResolver::load(session, guild_id).await?;
    notify(items, &mut resolver, session, format).await
}
