//! Error taxonomy
//!
//! - `DispatchError::InvalidUrl` blocks a send before any network attempt.
//! - `NetworkError` ends one send and is recorded on the tab.
//! - `PersistenceError` only ever degrades the history feature; the dispatcher never sees it.

use thiserror::Error;

/// Failure of a single send
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    #[error("invalid URL: {url:?}")]
    InvalidUrl { url: String },

    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl DispatchError {
    pub fn is_invalid_url(&self) -> bool {
        matches!(self, DispatchError::InvalidUrl { .. })
    }
}

/// Transport-level or HTTP-level failure
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NetworkError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {status} {status_text}")]
    Status { status: u16, status_text: String },

    #[error("error reading body: {0}")]
    Body(String),
}

/// History backend failure
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("history backend unreachable: {0}")]
    Transport(String),

    #[error("history backend rejected the request: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("could not determine data directory")]
    NoDataDir,
}

impl From<reqwest::Error> for PersistenceError {
    fn from(err: reqwest::Error) -> Self {
        PersistenceError::Transport(err.to_string())
    }
}

/// Local key/value store failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
