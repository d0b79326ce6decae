//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::activity::DEFAULT_LOG_CAPACITY;
use crate::errors::{CoreError, CoreResult};

/// Snapshot and event source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub snapshot_url: String,
    pub events_url: String,
    pub snapshot_timeout_secs: u64,
    /// Full reload interval, 0 disables polling
    pub poll_interval_secs: u64,
    pub event_buffer: usize,
    pub reconnect_delay_ms: u64,
    /// 0 = retry forever
    pub max_reconnects: u32,
}

impl FeedConfig {
    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_secs(self.snapshot_timeout_secs)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            snapshot_url: "http://localhost:5001/pairs".to_string(),
            events_url: "ws://localhost:5001/ws".to_string(),
            snapshot_timeout_secs: 10,
            poll_interval_secs: 180,
            event_buffer: 1024,
            reconnect_delay_ms: 2000,
            max_reconnects: 0,
        }
    }
}

/// Activity log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    pub max_entries: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_LOG_CAPACITY,
        }
    }
}

/// Complete monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub feed: FeedConfig,
    pub activity: ActivityConfig,
    /// How often the binary logs a feed summary
    pub summary_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            activity: ActivityConfig::default(),
            summary_interval_secs: 30,
        }
    }
}

impl MonitorConfig {
    pub fn summary_interval(&self) -> Duration {
        Duration::from_secs(self.summary_interval_secs.max(1))
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.feed.snapshot_url.trim().is_empty() {
            return Err(CoreError::InvalidConfig("feed.snapshot_url is empty".into()));
        }
        if self.feed.events_url.trim().is_empty() {
            return Err(CoreError::InvalidConfig("feed.events_url is empty".into()));
        }
        if self.feed.snapshot_timeout_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "feed.snapshot_timeout_secs must be positive".into(),
            ));
        }
        if self.feed.event_buffer == 0 {
            return Err(CoreError::InvalidConfig("feed.event_buffer must be positive".into()));
        }
        if self.activity.max_entries == 0 {
            return Err(CoreError::InvalidConfig(
                "activity.max_entries must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
