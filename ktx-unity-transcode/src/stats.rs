//! Selection statistics
//!
//! Counters updated by [`FormatSelector`](crate::FormatSelector). They make
//! cache behaviour observable, e.g. that a cached mask never rescans the catalog.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Atomic counters for format selection
#[derive(Debug, Default)]
pub struct SelectionStats {
    /// Number of catalog scans (one per attempted mask, fallback included)
    pub catalog_scans: AtomicUsize,
    /// Number of selections answered from the cache
    pub cache_hits: AtomicUsize,
    /// Number of selections that had to scan
    pub cache_misses: AtomicUsize,
    /// Number of alpha requests resolved with an opaque format
    pub alpha_fallbacks: AtomicUsize,
    /// Number of selections that found nothing
    pub failures: AtomicUsize,
    /// Number of calls to the support predicate
    pub support_queries: AtomicUsize,
}

impl SelectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_scan(&self) {
        self.catalog_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alpha_fallback(&self) {
        self.alpha_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_support_query(&self) {
        self.support_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics
    pub fn snapshot(&self) -> SelectionSnapshot {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);

        SelectionSnapshot {
            catalog_scans: self.catalog_scans.load(Ordering::Relaxed),
            cache_hits: hits,
            cache_misses: misses,
            alpha_fallbacks: self.alpha_fallbacks.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            support_queries: self.support_queries.load(Ordering::Relaxed),
            cache_hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.catalog_scans.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        self.alpha_fallbacks.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.support_queries.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`SelectionStats`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub catalog_scans: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub alpha_fallbacks: usize,
    pub failures: usize,
    pub support_queries: usize,
    pub cache_hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = SelectionStats::new();
        stats.record_cache_miss();
        stats.record_scan();
        stats.record_scan();
        stats.record_cache_hit();
        stats.record_cache_hit();
        stats.record_cache_hit();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.catalog_scans, 2);
        assert_eq!(snapshot.cache_hits, 3);
        assert_eq!(snapshot.cache_misses, 1);
        assert!((snapshot.cache_hit_rate - 0.75).abs() < f64::EPSILON);

        stats.reset();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.catalog_scans, 0);
        assert_eq!(snapshot.cache_hit_rate, 0.0);
    }
}
