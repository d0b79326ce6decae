//! Shared feed state
//!
//! One lock guards the collection and the log together. Writers hold it for
//! a single merge and never across an await point. Readers get detached
//! copies that stay valid while later events are applied.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use pairwatch_core::{ActivityLogEntry, FeedSummary, PairRecord, DEFAULT_LOG_CAPACITY};

use crate::engine::{FeedEngine, FeedStats};

/// Cloneable handle to the observable state of one session
#[derive(Debug, Clone)]
pub struct FeedState {
    inner: Arc<RwLock<FeedEngine>>,
}

impl FeedState {
    pub fn new(log_capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(FeedEngine::new(log_capacity))),
        }
    }

    /// Run one mutation under the write lock
    pub fn write<R>(&self, f: impl FnOnce(&mut FeedEngine) -> R) -> R {
        let mut engine = self.inner.write();
        f(&mut *engine)
    }

    pub fn current_view(&self) -> Vec<Arc<PairRecord>> {
        self.inner.read().current_view()
    }

    pub fn current_log(&self) -> Vec<ActivityLogEntry> {
        self.inner.read().current_log()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.inner.read().last_update()
    }

    pub fn summarize(&self) -> FeedSummary {
        self.inner.read().summarize()
    }

    /// Re-resolve a pair by address, e.g. for a selection held by a view
    pub fn get(&self, address: &str) -> Option<Arc<PairRecord>> {
        self.inner.read().get(address)
    }

    pub fn stats(&self) -> FeedStats {
        self.inner.read().stats()
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
