//! Last-good statistics cache
//!
//! Holds the most recent full-corpus snapshot so unfiltered dashboard
//! queries avoid rescanning the store. Warmed at startup, replaced
//! synchronously after every accepted submission. A failed write leaves the
//! previous snapshot in place. Date-filtered queries bypass the cache
//! entirely.

use crate::stats::StatsReport;
use std::sync::RwLock;

/// Read-frequently, write-rarely snapshot holder.
#[derive(Default)]
pub struct StatsCache {
    inner: RwLock<Option<StatsReport>>,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, `None` until first warmed. Callers seeing `None`
    /// must compute eagerly rather than report missing statistics.
    pub fn get(&self) -> Option<StatsReport> {
        self.inner.read().unwrap().clone()
    }

    /// Replace the snapshot atomically.
    pub fn replace(&self, report: StatsReport) {
        *self.inner.write().unwrap() = Some(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::stats::aggregate;

    #[test]
    fn starts_empty_and_holds_latest_snapshot() {
        let cache = StatsCache::new();
        assert!(cache.get().is_none());

        cache.replace(aggregate(&[], &Schema::default()));
        assert_eq!(cache.get().unwrap().count, 0);
    }
}
