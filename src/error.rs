//! error type for store reads.
//!
//! the refresh loop treats every variant the same way (log, keep prior state).
//! the variants only exist so the log line says what went wrong.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store rejected query ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode store rows: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("store not configured: {0}")]
    Config(String),
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;
