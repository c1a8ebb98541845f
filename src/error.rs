//! Error types for selfoss-discord.

use thiserror::Error;

/// Common error type for a relay run.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Network, HTTP status or JSON decode failure against selfoss.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Malformed timestamp in an item or in the watermark file.
    #[error("parse error: {0}")]
    Parse(String),

    /// Discord login or ready handshake failed.
    #[error("login error: {0}")]
    Login(String),

    /// The Discord server or one of its channels could not be resolved.
    #[error("channel error: {0}")]
    Channel(String),

    /// Discord rejected a message.
    #[error("send error: {0}")]
    Send(String),

    /// Mark-as-read was refused by selfoss.
    ///
    /// This is the only error recovered locally: the acknowledgement loop
    /// logs it and stops instead of failing the run.
    #[error("acknowledge error: {0}")]
    Ack(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
