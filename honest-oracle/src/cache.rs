//! Per-asset eigenstate cache.
//!
//! Entries are immutable: a refresh swaps in a new `Arc` rather than
//! touching the old value, so readers never see a half-written eigenstate.

use dashmap::DashMap;
use std::sync::Arc;

use honest_eigenstate::Eigenstate;

/// A cached eigenstate and when it was stored.
#[derive(Debug, Clone)]
pub struct CachedEigenstate {
    pub eigenstate: Arc<Eigenstate>,
    /// Insertion time (epoch ms)
    pub inserted_at: i64,
}

impl CachedEigenstate {
    /// Age at `now_millis`.
    pub fn age_ms(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.inserted_at)
    }

    /// Whether the entry is younger than `ttl_ms`.
    pub fn is_fresh(&self, now_millis: i64, ttl_ms: u64) -> bool {
        let ttl = i64::try_from(ttl_ms).unwrap_or(i64::MAX);
        self.age_ms(now_millis) < ttl
    }
}

/// TTL cache keyed by upper-case asset symbol.
#[derive(Debug)]
pub struct EigenstateCache {
    entries: DashMap<String, CachedEigenstate>,
    ttl_ms: u64,
}

impl EigenstateCache {
    /// Create a cache with the given TTL.
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_ms,
        }
    }

    /// Get the TTL.
    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    /// Entry for `asset` if it has not expired.
    pub fn get_fresh(&self, asset: &str, now_millis: i64) -> Option<Arc<Eigenstate>> {
        self.entries
            .get(asset)
            .filter(|entry| entry.is_fresh(now_millis, self.ttl_ms))
            .map(|entry| Arc::clone(&entry.eigenstate))
    }

    /// Entry for `asset` regardless of age.
    pub fn get_any(&self, asset: &str) -> Option<CachedEigenstate> {
        self.entries.get(asset).map(|entry| entry.value().clone())
    }

    /// Replace the entry for `asset`.
    pub fn insert(&self, asset: impl Into<String>, eigenstate: Arc<Eigenstate>, now_millis: i64) {
        self.entries.insert(
            asset.into(),
            CachedEigenstate {
                eigenstate,
                inserted_at: now_millis,
            },
        );
    }

    /// Remove the entry for `asset`.
    pub fn invalidate(&self, asset: &str) -> bool {
        self.entries.remove(asset).is_some()
    }

    /// Number of cached assets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use honest_eigenstate::{Decision, EigenstateDimensions};

    fn eigenstate(asset: &str, timestamp: i64) -> Arc<Eigenstate> {
        Arc::new(Eigenstate {
            asset: asset.to_string(),
            timestamp,
            dimensions: EigenstateDimensions::default(),
            coherence: 0.0,
            phase_angle: 0.0,
            decision: Decision::Hold,
            truth_certificate: None,
        })
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let cache = EigenstateCache::new(5_000);
        cache.insert("BTC", eigenstate("BTC", 1_000), 1_000);

        assert!(cache.get_fresh("BTC", 1_000).is_some());
        assert!(cache.get_fresh("BTC", 5_999).is_some());
        assert!(cache.get_fresh("BTC", 6_000).is_none());
        assert_eq!(cache.get_any("BTC").unwrap().age_ms(6_000), 5_000);
        assert!(cache.get_fresh("ETH", 1_000).is_none());
    }

    #[test]
    fn test_insert_replaces_without_mutating_readers() {
        let cache = EigenstateCache::new(5_000);
        cache.insert("BTC", eigenstate("BTC", 1), 1);
        let held = cache.get_fresh("BTC", 1).unwrap();

        cache.insert("BTC", eigenstate("BTC", 2), 2);
        assert_eq!(held.timestamp, 1);
        assert_eq!(cache.get_fresh("BTC", 2).unwrap().timestamp, 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = EigenstateCache::new(5_000);
        cache.insert("BTC", eigenstate("BTC", 1), 1);
        cache.insert("ETH", eigenstate("ETH", 1), 1);

        assert!(cache.invalidate("BTC"));
        assert!(!cache.invalidate("BTC"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
