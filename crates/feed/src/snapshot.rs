//! Snapshot sources (request/response full listings)

use std::time::Duration;
use tracing::debug;

use pairwatch_core::{FeedError, FeedResult};

use crate::events::{decode_snapshot, Snapshot};

/// Returns the current full list of known pairs
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_pairs(&self) -> FeedResult<Snapshot>;
}

/// `GET <url>` returning a JSON array of pairs
pub struct HttpSnapshotSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSnapshotSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> FeedResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch_pairs(&self) -> FeedResult<Snapshot> {
        debug!("Fetching snapshot from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let snapshot = decode_snapshot(&body)?;
        debug!(
            records = snapshot.records.len(),
            malformed = snapshot.malformed.len(),
            "Snapshot decoded"
        );
        Ok(snapshot)
    }
}
