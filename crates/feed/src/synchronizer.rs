//! Feed synchronizer: merges snapshots and push events into one collection
//!
//! Merge policy:
//! - a snapshot replaces everything and keeps the input order
//! - a new pair goes to the front, or replaces in place if the key is known
//! - an update replaces in place, or goes to the front if the key is unknown
//!
//! Last applied wins. Record timestamps are never compared because the
//! upstream does not guarantee they are monotonic per key.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use pairwatch_core::{FeedError, FeedResult, PairAddress, PairRecord};

use crate::collection::{FeedCollection, MergeOutcome};

/// Result of a snapshot load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotReport {
    pub loaded: usize,
    pub rejected: Vec<FeedError>,
}

#[derive(Debug, Default)]
pub struct FeedSynchronizer {
    collection: FeedCollection,
    last_update: Option<DateTime<Utc>>,
}

impl FeedSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with `records`, in input order.
    ///
    /// Records without an address are rejected. A key repeated within the
    /// snapshot keeps its first position and its last value.
    pub fn load_snapshot(&mut self, records: Vec<PairRecord>) -> SnapshotReport {
        let mut collection = FeedCollection::new();
        let mut rejected = Vec::new();

        for record in records {
            match record.key() {
                Some(key) => {
                    if let MergeOutcome::Replaced { position } = collection.upsert_back(key, record)
                    {
                        debug!(position, "Duplicate key in snapshot, keeping latest value");
                    }
                }
                None => rejected.push(malformed(&record)),
            }
        }

        self.collection = collection;
        self.touch();

        SnapshotReport {
            loaded: self.collection.len(),
            rejected,
        }
    }

    /// Insert a freshly observed pair at the front. A known key degrades to
    /// an in-place update.
    pub fn apply_new_pair(&mut self, record: PairRecord) -> FeedResult<MergeOutcome> {
        let key = record.key().ok_or_else(|| malformed(&record))?;
        let outcome = self.collection.upsert_front(key, record);
        if let MergeOutcome::Replaced { position } = outcome {
            debug!(position, "New pair already tracked, applied as update");
        }
        self.touch();
        Ok(outcome)
    }

    /// Replace a known pair in place. An unknown key is an out-of-order
    /// arrival and is inserted at the front.
    pub fn apply_update(&mut self, record: PairRecord) -> FeedResult<MergeOutcome> {
        let key = record.key().ok_or_else(|| malformed(&record))?;
        let outcome = self.collection.upsert_front(key, record);
        if outcome == MergeOutcome::Inserted {
            debug!("Update for untracked pair, inserted at front");
        }
        self.touch();
        Ok(outcome)
    }

    pub fn current_view(&self) -> Vec<Arc<PairRecord>> {
        self.collection.view()
    }

    /// Look up a pair by address, any case
    pub fn get(&self, address: &str) -> Option<Arc<PairRecord>> {
        PairAddress::parse(address).and_then(|key| self.collection.get(&key))
    }

    pub fn position(&self, address: &str) -> Option<usize> {
        PairAddress::parse(address).and_then(|key| self.collection.position(&key))
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    fn touch(&mut self) {
        self.last_update = Some(Utc::now());
    }
}

fn malformed(record: &PairRecord) -> FeedError {
    FeedError::MalformedRecord(format!(
        "pair {} has no address (tx {:?})",
        record.symbols(),
        record.transaction_hash
    ))
}
