//! Error types

use std::time::Duration;
use thiserror::Error;

/// Core error types
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Feed errors. None of these are fatal: the feed keeps its last good state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("Snapshot source unreachable: {0}")]
    Transport(String),

    #[error("Failed to decode payload: {0}")]
    Decode(String),

    #[error("Snapshot fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Connection lost")]
    ConnectionLost,
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Decode(e.to_string())
    }
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
pub type FeedResult<T> = Result<T, FeedError>;
