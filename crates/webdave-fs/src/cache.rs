//! The metadata cache table.
//!
//! A plain map from canonical path to [`MetaSnapshot`] behind a
//! `parking_lot::RwLock`. The lock is only ever held for the map operation
//! itself, never across backend I/O. There is no TTL and no eviction: an
//! entry lives until a remove or rename through the overlay invalidates it.
//!
//! Every invalidation bumps an epoch and stamps the invalidated key with it.
//! A miss hands out the epoch it observed, and the later insert is dropped
//! only if that same key was stamped in between. A backend answer fetched
//! before a removal can't land in the table after it, while invalidations of
//! other keys never cost an insert.

use crate::metadata::MetaSnapshot;
use crate::stats::CacheStats;
use dav_server::davpath::DavPath;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Canonical cache key for a request path.
///
/// The root maps to `/`; every other path maps to `/a/b` with trailing and
/// repeated leading slashes removed, so a collection requested as `/dir/`
/// shares its entry with `/dir`.
pub fn cache_key(path: &DavPath) -> String {
    normalize(&path.as_url_string())
}

fn normalize(raw: &str) -> String {
    let trimmed = raw.trim_start_matches('/').trim_end_matches('/');
    format!("/{trimmed}")
}

/// Result of a table lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The key is present.
    Hit(MetaSnapshot),
    /// The key is absent; `epoch` must be passed back to [`MetadataCache::insert`].
    Miss { epoch: u64 },
}

#[derive(Debug, Default)]
struct Table {
    entries: HashMap<String, MetaSnapshot>,
    /// Epoch of the latest invalidation of each key ever invalidated.
    invalidated_at: HashMap<String, u64>,
    epoch: u64,
}

impl Table {
    /// Whether `key` was invalidated after a miss that observed `epoch`.
    fn invalidated_since(&self, key: &str, epoch: u64) -> bool {
        self.invalidated_at.get(key).is_some_and(|&at| at > epoch)
    }
}

/// Path-keyed metadata table shared by all clones of one overlay.
#[derive(Debug)]
pub struct MetadataCache {
    table: RwLock<Table>,
    stats: Arc<CacheStats>,
}

impl MetadataCache {
    pub fn new(stats: Arc<CacheStats>) -> Self {
        Self {
            table: RwLock::new(Table::default()),
            stats,
        }
    }

    /// Look up a key. Records a hit or a miss.
    pub fn lookup(&self, key: &str) -> Lookup {
        let lookup = {
            let table = self.table.read();
            match table.entries.get(key) {
                Some(meta) => Lookup::Hit(meta.clone()),
                None => Lookup::Miss { epoch: table.epoch },
            }
        };
        match lookup {
            Lookup::Hit(_) => self.stats.record_hit(),
            Lookup::Miss { .. } => self.stats.record_miss(),
        }
        lookup
    }

    /// Store a freshly fetched snapshot. Last writer wins for a key.
    ///
    /// Returns `false` (and stores nothing) if `key` was invalidated since
    /// the miss that produced `epoch`.
    pub fn insert(&self, key: String, meta: MetaSnapshot, epoch: u64) -> bool {
        let mut table = self.table.write();
        if table.invalidated_since(&key, epoch) {
            return false;
        }
        table.entries.insert(key, meta);
        self.stats.set_entries(table.entries.len());
        drop(table);
        self.stats.record_insert();
        true
    }

    /// Remove exactly one key. Returns whether an entry was present.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut table = self.table.write();
        table.epoch += 1;
        let epoch = table.epoch;
        table.invalidated_at.insert(key.to_string(), epoch);
        let removed = table.entries.remove(key).is_some();
        self.stats.set_entries(table.entries.len());
        drop(table);
        if removed {
            self.stats.record_invalidation();
        }
        removed
    }

    /// Cached snapshot for a key without touching the statistics.
    pub fn peek(&self, key: &str) -> Option<MetaSnapshot> {
        self.table.read().entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.table.read().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.table.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().entries.is_empty()
    }
}
