//! Error taxonomy for revealbot
//!
//! Clients return explicit errors instead of swallowing failures, so callers
//! decide the retry policy. The polling loop treats any `FetchError` as
//! "unknown, keep polling"; it never drops a token because of one.

use thiserror::Error;

/// Failure of a single metadata round-trip
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {endpoint}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed response body: {0}")]
    Malformed(String),
}

/// Failure of a watch-list load or save
#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("failed to access watch-list file: {0}")]
    Io(#[from] std::io::Error),

    #[error("watch-list file is not a JSON array of token ids: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("watch-list load cancelled by shutdown")]
    Cancelled,

    #[error("watch-list not available after {0} attempts")]
    RetriesExhausted(u32),
}
