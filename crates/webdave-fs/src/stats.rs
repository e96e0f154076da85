//! Lock-free counters for the metadata cache.
//!
//! # Usage
//!
//! ```
//! use webdave_fs::CacheStats;
//!
//! let stats = CacheStats::new();
//! stats.record_miss();
//! stats.record_backend_lookup();
//! stats.record_insert();
//! stats.record_hit();
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.hits, 1);
//! assert!((snapshot.hit_rate() - 0.5).abs() < f64::EPSILON);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing cache behavior since the overlay was created.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Lookups served from the table.
    pub hits: AtomicU64,
    /// Lookups that had to consult the backend.
    pub misses: AtomicU64,
    /// Backend stat calls issued on behalf of misses.
    pub backend_lookups: AtomicU64,
    /// Successful backend stats written into the table.
    pub inserts: AtomicU64,
    /// Entries removed by remove/rename.
    pub invalidations: AtomicU64,
    /// Entries currently in the table.
    pub entries: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_backend_lookup(&self) {
        self.backend_lookups.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the current table size (set by the table under its lock).
    #[inline]
    pub fn set_entries(&self, entries: usize) {
        self.entries.store(entries as u64, Ordering::Relaxed);
    }

    /// Take a consistent-enough copy of all counters for reporting.
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            backend_lookups: self.backend_lookups.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            entries: self.entries.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub backend_lookups: u64,
    pub inserts: u64,
    pub invalidations: u64,
    pub entries: u64,
}

impl CacheStatsSnapshot {
    /// Compute the cache hit rate as a fraction (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
