//! Ordered, de-duplicated pair collection keyed by canonical address

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use pairwatch_core::{PairAddress, PairRecord};

/// Where a merged record ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// New key, placed at the front
    Inserted,
    /// Existing key, value replaced at its current position
    Replaced { position: usize },
}

/// Newest-first view order plus keyed storage. Every key in `order`
/// has exactly one entry in `records` and vice versa.
#[derive(Debug, Clone, Default)]
pub struct FeedCollection {
    order: VecDeque<PairAddress>,
    records: HashMap<PairAddress, Arc<PairRecord>>,
}

impl FeedCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, key: &PairAddress) -> Option<Arc<PairRecord>> {
        self.records.get(key).cloned()
    }

    pub fn position(&self, key: &PairAddress) -> Option<usize> {
        self.order.iter().position(|k| k == key)
    }

    /// Replace in place if the key exists, otherwise insert at the front.
    pub fn upsert_front(&mut self, key: PairAddress, record: PairRecord) -> MergeOutcome {
        self.upsert(key, record, |order, key| order.push_front(key))
    }

    /// Replace in place if the key exists, otherwise append at the back.
    /// Used while building a collection from an ordered snapshot.
    pub fn upsert_back(&mut self, key: PairAddress, record: PairRecord) -> MergeOutcome {
        self.upsert(key, record, |order, key| order.push_back(key))
    }

    fn upsert(
        &mut self,
        key: PairAddress,
        record: PairRecord,
        place: impl FnOnce(&mut VecDeque<PairAddress>, PairAddress),
    ) -> MergeOutcome {
        let record = Arc::new(record);

        if let Some(position) = self.position(&key) {
            let previous = self.records.insert(key, record);
            debug_assert!(previous.is_some(), "ordered key missing from records");
            return MergeOutcome::Replaced { position };
        }

        let previous = self.records.insert(key.clone(), record);
        debug_assert!(previous.is_none(), "stored key missing from order");
        place(&mut self.order, key);
        MergeOutcome::Inserted
    }

    /// Records in view order. Cheap: clones `Arc`s, not records.
    pub fn view(&self) -> Vec<Arc<PairRecord>> {
        self.order
            .iter()
            .filter_map(|key| self.records.get(key).cloned())
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PairAddress> {
        self.order.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::pair;

    fn key(raw: &str) -> PairAddress {
        PairAddress::parse(raw).unwrap()
    }

    #[test]
    fn test_front_insert_and_in_place_replace() {
        let mut c = FeedCollection::new();
        assert_eq!(c.upsert_front(key("0xa"), pair("0xa", "A", "WETH")), MergeOutcome::Inserted);
        assert_eq!(c.upsert_front(key("0xb"), pair("0xb", "B", "WETH")), MergeOutcome::Inserted);
        assert_eq!(c.upsert_front(key("0xc"), pair("0xc", "C", "WETH")), MergeOutcome::Inserted);

        let outcome = c.upsert_front(key("0xB"), pair("0xB", "B2", "WETH"));
        assert_eq!(outcome, MergeOutcome::Replaced { position: 1 });

        let symbols: Vec<_> = c.view().iter().map(|p| p.token0.symbol.clone()).collect();
        assert_eq!(symbols, vec!["C", "B2", "A"]);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_back_insert_preserves_input_order() {
        let mut c = FeedCollection::new();
        for addr in ["0x1", "0x2", "0x3"] {
            c.upsert_back(key(addr), pair(addr, "T", "WETH"));
        }
        let keys: Vec<_> = c.keys().map(|k| k.as_str().to_string()).collect();
        assert_eq!(keys, vec!["0x1", "0x2", "0x3"]);
        assert_eq!(c.position(&key("0x3")), Some(2));
    }

    #[test]
    fn test_replace_reports_actual_position() {
        let mut c = FeedCollection::new();
        for addr in ["0x1", "0x2", "0x3", "0x4"] {
            c.upsert_back(key(addr), pair(addr, "T", "WETH"));
        }

        assert_eq!(
            c.upsert_front(key("0x4"), pair("0x4", "T2", "WETH")),
            MergeOutcome::Replaced { position: 3 }
        );
        assert_eq!(
            c.upsert_back(key("0X3"), pair("0X3", "T2", "WETH")),
            MergeOutcome::Replaced { position: 2 }
        );
        assert_eq!(c.len(), 4);
        assert_eq!(c.keys().count(), c.view().len());
    }

    #[test]
    fn test_view_is_detached_from_later_writes() {
        let mut c = FeedCollection::new();
        c.upsert_front(key("0x1"), pair("0x1", "OLD", "WETH"));
        let view = c.view();

        c.upsert_front(key("0x1"), pair("0x1", "NEW", "WETH"));
        c.upsert_front(key("0x2"), pair("0x2", "X", "WETH"));

        assert_eq!(view.len(), 1);
        assert_eq!(view[0].token0.symbol, "OLD");
    }
}
