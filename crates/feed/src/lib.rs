//! Pair feed synchronization
//!
//! Features:
//! - Snapshot over HTTP, push events over WebSocket
//! - Order-preserving merge keyed by pair address
//! - Bounded activity log mirrored to tracing
//! - Single-writer session with periodic reloads and reconnect resync

pub mod collection;
pub mod engine;
pub mod events;
pub mod feeds;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod synchronizer;

#[cfg(test)]
mod test_support;

pub use collection::MergeOutcome;
pub use engine::{FeedEngine, FeedStats, Reaction};
pub use events::{decode_event, decode_snapshot, EventItem, FeedEvent, Snapshot};
pub use feeds::{WsEventFeed, WsFeedConfig};
pub use session::{FeedSession, SessionConfig};
pub use snapshot::{HttpSnapshotSource, SnapshotSource};
pub use state::FeedState;
pub use synchronizer::{FeedSynchronizer, SnapshotReport};
