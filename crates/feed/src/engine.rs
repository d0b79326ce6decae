//! Applies events and snapshot results to the synchronizer and records
//! what happened in the activity log.
//!
//! Everything here is synchronous and I/O free, so a bare sequence of
//! events can drive it in tests.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use pairwatch_core::serde_utils::parse_timestamp;
use pairwatch_core::{
    classify, summarize, ActivityLog, ActivityLogEntry, FeedError, FeedResult, FeedSummary,
    PairRecord, RiskLevel, Severity,
};

use crate::events::{FeedEvent, Snapshot};
use crate::synchronizer::FeedSynchronizer;

/// What the caller should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Continue,
    /// Reload the snapshot: the connection came back after a loss, or no
    /// snapshot has loaded successfully yet
    Resync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connection {
    Initial,
    Up,
    Down,
}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub pair_count: usize,
    pub log_len: usize,
    pub snapshot_loads: u64,
    pub snapshot_failures: u64,
    pub events_applied: u64,
    pub malformed_dropped: u64,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct FeedEngine {
    sync: FeedSynchronizer,
    log: ActivityLog,
    connection: Connection,
    snapshot_loads: u64,
    snapshot_failures: u64,
    last_fetch_failed: bool,
    events_applied: u64,
    malformed_dropped: u64,
}

impl FeedEngine {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            sync: FeedSynchronizer::new(),
            log: ActivityLog::new(log_capacity),
            connection: Connection::Initial,
            snapshot_loads: 0,
            snapshot_failures: 0,
            last_fetch_failed: false,
            events_applied: 0,
            malformed_dropped: 0,
        }
    }

    /// Apply one decoded event.
    pub fn apply_event(&mut self, event: FeedEvent) -> Reaction {
        self.events_applied += 1;
        debug!(kind = event.kind(), "Applying event");

        match event {
            FeedEvent::Connected => {
                let reconnected = self.connection == Connection::Down;
                self.connection = Connection::Up;
                self.append_log(Severity::Success, "Connected to server", None);
                if reconnected || self.needs_snapshot() {
                    return Reaction::Resync;
                }
            }
            FeedEvent::Disconnected => {
                self.connection = Connection::Down;
                self.append_log(
                    Severity::Error,
                    format!("Disconnected from server: {}", FeedError::ConnectionLost),
                    None,
                );
            }
            FeedEvent::NewPair(pair) => {
                let message = format!("New pair detected: {}", pair.symbols());
                let honeypot = honeypot_warning(&pair);
                match self.sync.apply_new_pair(pair) {
                    Ok(_) => {
                        if let Some(warning) = honeypot {
                            warn!("{}", warning);
                        }
                        self.append_log(Severity::Info, message, None);
                    }
                    Err(e) => self.reject(e),
                }
            }
            FeedEvent::PairUpdated(pair) => {
                let message = format!("Updated pair: {}", pair.symbols());
                match self.sync.apply_update(pair) {
                    Ok(_) => {
                        self.append_log(Severity::Info, message, None);
                    }
                    Err(e) => self.reject(e),
                }
            }
            FeedEvent::LogMessage {
                severity,
                message,
                timestamp,
            } => {
                let severity = Severity::from_upstream(&severity);
                self.append_log(severity, message, parse_timestamp(&timestamp));
            }
        }

        Reaction::Continue
    }

    /// Record an event that could not be decoded or merged.
    pub fn reject(&mut self, err: FeedError) {
        self.malformed_dropped += 1;
        self.append_log(Severity::Error, format!("Dropped input: {err}"), None);
    }

    /// Apply the outcome of a snapshot fetch. A failed fetch leaves the
    /// collection untouched.
    pub fn apply_snapshot(&mut self, result: FeedResult<Snapshot>) {
        match result {
            Ok(snapshot) => {
                self.snapshot_loads += 1;
                self.last_fetch_failed = false;
                let report = self.sync.load_snapshot(snapshot.records);
                for err in snapshot.malformed.into_iter().chain(report.rejected) {
                    self.reject(err);
                }
                self.append_log(
                    Severity::Success,
                    format!("Loaded {} pairs from snapshot", report.loaded),
                    None,
                );
            }
            Err(e) => {
                self.snapshot_failures += 1;
                self.last_fetch_failed = true;
                self.append_log(
                    Severity::Error,
                    format!("Failed to fetch pairs: {e}"),
                    None,
                );
            }
        }
    }

    /// No good snapshot is in place: none has loaded yet, or the latest
    /// attempt failed.
    pub fn needs_snapshot(&self) -> bool {
        self.snapshot_loads == 0 || self.last_fetch_failed
    }

    /// Append to the activity log and mirror the entry to tracing.
    pub fn append_log(
        &mut self,
        severity: Severity,
        message: impl Into<String>,
        timestamp: Option<DateTime<Utc>>,
    ) -> &ActivityLogEntry {
        let entry = self.log.append(severity, message, timestamp);
        match entry.severity {
            Severity::Info | Severity::Success => info!(severity = %entry.severity, "{}", entry.message),
            Severity::Warning => warn!("{}", entry.message),
            Severity::Error => error!("{}", entry.message),
        }
        entry
    }

    pub fn current_view(&self) -> Vec<Arc<PairRecord>> {
        self.sync.current_view()
    }

    pub fn current_log(&self) -> Vec<ActivityLogEntry> {
        self.log.snapshot()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.sync.last_update()
    }

    pub fn summarize(&self) -> FeedSummary {
        summarize(self.sync.current_view())
    }

    pub fn get(&self, address: &str) -> Option<Arc<PairRecord>> {
        self.sync.get(address)
    }

    pub fn stats(&self) -> FeedStats {
        FeedStats {
            pair_count: self.sync.len(),
            log_len: self.log.len(),
            snapshot_loads: self.snapshot_loads,
            snapshot_failures: self.snapshot_failures,
            events_applied: self.events_applied,
            malformed_dropped: self.malformed_dropped,
            last_update: self.sync.last_update(),
        }
    }
}

fn honeypot_warning(pair: &PairRecord) -> Option<String> {
    [(&pair.token0, &pair.security0), (&pair.token1, &pair.security1)]
        .into_iter()
        .find(|(_, security)| classify(security.as_ref()) == RiskLevel::High)
        .map(|(token, security)| {
            let reason = security
                .as_ref()
                .and_then(|s| s.honeypot_reason.as_deref())
                .unwrap_or("no reason given");
            format!("Honeypot detected in {}: {} ({})", pair.address, token.symbol, reason)
        })
}
