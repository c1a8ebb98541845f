//! Selfoss aggregator access.
//!
//! Fetches item listings and acknowledges items as read.

pub mod client;
pub mod types;

pub use client::SelfossClient;
pub use types::{Cursor, Item};
