//! Feed events and their wire decoding
//!
//! Push frames look like `{"event": "new_pair", "data": {...}}`. Connection
//! lifecycle events are produced by the transport, never decoded.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use pairwatch_core::{FeedError, FeedResult, PairRecord};

/// One event from the event source
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Connected,
    Disconnected,
    NewPair(PairRecord),
    PairUpdated(PairRecord),
    LogMessage {
        severity: String,
        message: String,
        timestamp: String,
    },
}

impl FeedEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            FeedEvent::Connected => "connected",
            FeedEvent::Disconnected => "disconnected",
            FeedEvent::NewPair(_) => "new_pair",
            FeedEvent::PairUpdated(_) => "pair_updated",
            FeedEvent::LogMessage { .. } => "server_log",
        }
    }
}

/// What the event channel carries: decoded events or decode failures
pub type EventItem = FeedResult<FeedEvent>;

#[derive(Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
enum WireEvent {
    NewPair(PairRecord),
    PairUpdated(PairRecord),
    ServerLog(WireLog),
}

#[derive(Deserialize)]
struct WireLog {
    #[serde(default, alias = "severity")]
    level: String,
    message: String,
    #[serde(default)]
    timestamp: Value,
}

/// Decode one push frame.
pub fn decode_event(text: &str) -> FeedResult<FeedEvent> {
    let wire: WireEvent =
        serde_json::from_str(text).map_err(|e| FeedError::MalformedEvent(e.to_string()))?;

    Ok(match wire {
        WireEvent::NewPair(pair) => FeedEvent::NewPair(pair),
        WireEvent::PairUpdated(pair) => FeedEvent::PairUpdated(pair),
        WireEvent::ServerLog(log) => FeedEvent::LogMessage {
            severity: log.level,
            message: log.message,
            timestamp: match log.timestamp {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            },
        },
    })
}

/// A decoded snapshot. Elements that failed to decode are reported
/// separately so the rest of the listing still loads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub records: Vec<PairRecord>,
    pub malformed: Vec<FeedError>,
}

impl From<Vec<PairRecord>> for Snapshot {
    fn from(records: Vec<PairRecord>) -> Self {
        Self {
            records,
            malformed: Vec::new(),
        }
    }
}

/// Decode a snapshot body. Anything other than a JSON array is a decode error.
pub fn decode_snapshot(body: &str) -> FeedResult<Snapshot> {
    let items: Vec<Value> = serde_json::from_str(body)?;
    let mut snapshot = Snapshot::default();

    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<PairRecord>(item) {
            Ok(record) => snapshot.records.push(record),
            Err(e) => {
                warn!(index, error = %e, "Dropping undecodable snapshot record");
                snapshot
                    .malformed
                    .push(FeedError::MalformedRecord(format!("snapshot[{index}]: {e}")));
            }
        }
    }

    Ok(snapshot)
}
