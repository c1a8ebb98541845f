//! Delivery of items to Discord.
//!
//! Items are sent strictly one after another, in input order. The first
//! failure aborts the remaining sends.

pub mod ack;
pub mod channel;
pub mod message;

pub use ack::{acknowledge, AckReport};
pub use channel::ChannelResolver;
pub use message::{channel_name, message_text, FooterStyle, MessageFormat, MAX_MESSAGE_CHARS};

use tracing::{debug, info};

use crate::discord::DiscordSession;
use crate::selfoss::Item;
use crate::Result;

/// Send one message per item and return how many were sent.
pub async fn notify(
    items: &[Item],
    resolver: &mut ChannelResolver,
    session: &DiscordSession,
    format: &MessageFormat,
) -> Result<usize> {
    let mut sent = 0;

    for item in items {
        let channel_id = resolver.resolve(session, &item.source_title).await?;
        let embed = format.build(item)?;
        let message = session.send_embed(&channel_id, embed).await?;
        debug!(
            "Sent item {} to channel {} as message {}",
            item.id, channel_id, message.id
        );
        sent += 1;
    }

    info!("Sent {} message(s)", sent);
    Ok(sent)
}
