//! Mark-as-read acknowledgements.
//!
//! Acknowledgement is best effort and not atomic with delivery: the first
//! refused item stops the loop and everything after it stays unread, to be
//! delivered again on the next run.

use tracing::{debug, warn};

use crate::config::Credentials;
use crate::selfoss::{Item, SelfossClient};

/// Result of an acknowledgement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AckReport {
    /// Items successfully marked as read.
    pub acknowledged: usize,
    /// The item whose acknowledgement failed, if any.
    pub failed_id: Option<u64>,
}

/// Mark each item as read, in order, stopping at the first failure.
pub async fn acknowledge(
    client: &SelfossClient,
    items: &[Item],
    credentials: &Credentials,
) -> AckReport {
    let mut report = AckReport::default();

    for item in items {
        match client.mark_as_read(item.id, credentials).await {
            Ok(()) => {
                debug!("Marked item {} as read", item.id);
                report.acknowledged += 1;
            }
            Err(e) => {
                warn!("Failed to mark item {} as read: {}", item.id, e);
                report.failed_id = Some(item.id);
                break;
            }
        }
    }

    report
}
