//! Incremental fetch watermark.
//!
//! The watermark is the newest item timestamp already handed to Discord.
//! It lives in a one-line text file and only ever moves forward: it is
//! rewritten only when a run selected at least one new item.

use std::path::{Path, PathBuf};

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::debug;

use crate::datetime::{first_run_watermark, format_watermark, parse_watermark};
use crate::selfoss::Item;
use crate::Result;

/// Items newer than the watermark, and the watermark to persist next.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Items strictly newer than the input watermark, in input order.
    pub items: Vec<Item>,
    /// Newest timestamp across the whole batch.
    pub watermark: DateTime<Tz>,
}

impl Selection {
    /// Whether no item qualified.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Select the items newer than `watermark`.
///
/// Item times are normalized to the watermark's timezone before comparing.
/// The returned watermark is the maximum over the entire batch, not just
/// the selected items; an empty batch yields the first-run watermark.
/// A malformed timestamp fails the whole batch.
pub fn select_new(items: &[Item], watermark: &DateTime<Tz>) -> Result<Selection> {
    let tz = watermark.timezone();
    let mut selected = Vec::new();
    let mut latest: Option<DateTime<Tz>> = None;

    for item in items {
        let timestamp = item.published_at()?.with_timezone(&tz);

        if timestamp > *watermark {
            selected.push(item.clone());
        }

        latest = Some(match latest {
            Some(current) => current.max(timestamp),
            None => timestamp,
        });
    }

    Ok(Selection {
        items: selected,
        watermark: latest.unwrap_or_else(|| first_run_watermark(&tz)),
    })
}

/// File-backed watermark storage.
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
    tz: Tz,
}

impl WatermarkStore {
    /// Create a store for the given file and timezone.
    pub fn new(path: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            path: path.into(),
            tz,
        }
    }

    /// Path of the watermark file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored watermark, or `None` if the file does not exist yet.
    pub fn load(&self) -> Result<Option<DateTime<Tz>>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => parse_watermark(&content, &self.tz).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the stored watermark, falling back to the first-run watermark.
    pub fn load_or_default(&self) -> Result<DateTime<Tz>> {
        Ok(self
            .load()?
            .unwrap_or_else(|| first_run_watermark(&self.tz)))
    }

    /// Write the watermark unconditionally.
    pub fn save(&self, watermark: &DateTime<Tz>) -> Result<()> {
        let line = format_watermark(&watermark.with_timezone(&self.tz));
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, format!("{}\n", line))?;
        debug!("Watermark {} written to {}", line, self.path.display());
        Ok(())
    }

    /// Persist the selection's watermark if it selected anything.
    ///
    /// Returns whether the file was written.
    pub fn advance(&self, selection: &Selection) -> Result<bool> {
        if selection.is_empty() {
            return Ok(false);
        }
        self.save(&selection.watermark)?;
        Ok(true)
    }
}
