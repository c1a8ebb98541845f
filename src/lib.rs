//! selfoss-discord
//!
//! Polls a selfoss feed aggregator for new or unread items and posts each
//! one to a per-source channel of a Discord server.

pub mod cli;
pub mod config;
pub mod datetime;
pub mod discord;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod runner;
pub mod selfoss;
pub mod watermark;

pub use cli::Cli;
pub use config::Config;
pub use error::{RelayError, Result};
pub use runner::{run, RunOutcome};
