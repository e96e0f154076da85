//! The caching filesystem overlay.
//!
//! [`CachedFs`] wraps any [`DavFileSystem`] and short-circuits repeated
//! `metadata` calls through a [`MetadataCache`]. Mutations that remove or
//! rename a path drop that path's entry *before* the backend call is issued,
//! so a concurrent stat either sees the old entry (it read first) or misses
//! and asks the backend.
//!
//! Invalidation is scoped to the exact path named by `remove_file`,
//! `remove_dir` and the source of `rename`. Rename destinations, parents,
//! descendants and paths touched by `create_dir`, `open` for writing or
//! `copy` are left alone.

use crate::cache::{cache_key, Lookup, MetadataCache};
use crate::metadata::MetaSnapshot;
use crate::stats::CacheStats;
use dav_server::davpath::DavPath;
use dav_server::fs::{
    DavDirEntry, DavFile, DavFileSystem, DavMetaData, FsFuture, FsResult, FsStream, OpenOptions,
    ReadDirMeta,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{instrument, trace};

/// Metadata-caching wrapper around a backing filesystem.
///
/// Cloning is cheap: clones share the backend and the cache table.
pub struct CachedFs<F> {
    /// Backing filesystem (shared, not owned).
    inner: Arc<F>,
    /// Path -> snapshot table.
    cache: Arc<MetadataCache>,
    /// Hit/miss counters.
    stats: Arc<CacheStats>,
}

impl<F> Clone for CachedFs<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cache: Arc::clone(&self.cache),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<F: DavFileSystem + Send + Sync + 'static> CachedFs<F> {
    /// Wrap a backing filesystem with an empty cache.
    pub fn new(inner: Arc<F>) -> Self {
        let stats = Arc::new(CacheStats::new());
        Self {
            inner,
            cache: Arc::new(MetadataCache::new(Arc::clone(&stats))),
            stats,
        }
    }

    /// Statistics for this overlay's cache.
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    /// The cache table (read-only inspection).
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// The wrapped backing filesystem.
    pub fn inner(&self) -> &Arc<F> {
        &self.inner
    }

    /// Cached stat: serve from the table or fetch, insert and return.
    ///
    /// Backend errors are returned as-is and nothing is cached for them.
    pub async fn stat(&self, path: &DavPath) -> FsResult<MetaSnapshot> {
        let key = cache_key(path);
        let epoch = match self.cache.lookup(&key) {
            Lookup::Hit(meta) => {
                trace!(key = %key, "metadata cache hit");
                return Ok(meta);
            }
            Lookup::Miss { epoch } => epoch,
        };

        self.stats.record_backend_lookup();
        let meta = self.inner.metadata(path).await?;
        let snapshot = MetaSnapshot::capture(&*meta);
        if self.cache.insert(key.clone(), snapshot.clone(), epoch) {
            trace!(key = %key, len = snapshot.len, is_dir = snapshot.is_dir, "metadata cache miss, cached");
        } else {
            trace!(key = %key, "metadata cache miss, invalidated in flight, not cached");
        }
        Ok(snapshot)
    }

    fn invalidate(&self, path: &DavPath) {
        let key = cache_key(path);
        if self.cache.invalidate(&key) {
            trace!(key = %key, "metadata cache entry invalidated");
        }
    }
}

impl<F: DavFileSystem + Send + Sync + 'static> DavFileSystem for CachedFs<F> {
    #[instrument(level = "debug", skip_all, fields(path = %path.as_url_string()))]
    fn open<'a>(&'a self, path: &'a DavPath, options: OpenOptions) -> FsFuture<'a, Box<dyn DavFile>> {
        self.inner.open(path, options)
    }

    #[instrument(level = "debug", skip_all, fields(path = %path.as_url_string()))]
    fn read_dir<'a>(
        &'a self,
        path: &'a DavPath,
        meta: ReadDirMeta,
    ) -> FsFuture<'a, FsStream<Box<dyn DavDirEntry>>> {
        self.inner.read_dir(path, meta)
    }

    #[instrument(level = "debug", skip_all, fields(path = %path.as_url_string()))]
    fn metadata<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Box<dyn DavMetaData>> {
        Box::pin(async move {
            let meta = self.stat(path).await?;
            Ok(Box::new(meta) as Box<dyn DavMetaData>)
        })
    }

    fn symlink_metadata<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Box<dyn DavMetaData>> {
        self.inner.symlink_metadata(path)
    }

    #[instrument(level = "debug", skip_all, fields(path = %path.as_url_string()))]
    fn create_dir<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        self.inner.create_dir(path)
    }

    #[instrument(level = "debug", skip_all, fields(path = %path.as_url_string()))]
    fn remove_dir<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        Box::pin(async move {
            self.invalidate(path);
            self.inner.remove_dir(path).await
        })
    }

    #[instrument(level = "debug", skip_all, fields(path = %path.as_url_string()))]
    fn remove_file<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        Box::pin(async move {
            self.invalidate(path);
            self.inner.remove_file(path).await
        })
    }

    #[instrument(level = "debug", skip_all, fields(from = %from.as_url_string(), to = %to.as_url_string()))]
    fn rename<'a>(&'a self, from: &'a DavPath, to: &'a DavPath) -> FsFuture<'a, ()> {
        Box::pin(async move {
            self.invalidate(from);
            self.inner.rename(from, to).await
        })
    }

    #[instrument(level = "debug", skip_all, fields(from = %from.as_url_string(), to = %to.as_url_string()))]
    fn copy<'a>(&'a self, from: &'a DavPath, to: &'a DavPath) -> FsFuture<'a, ()> {
        self.inner.copy(from, to)
    }

    fn set_accessed<'a>(&'a self, path: &'a DavPath, tm: SystemTime) -> FsFuture<'a, ()> {
        self.inner.set_accessed(path, tm)
    }

    fn set_modified<'a>(&'a self, path: &'a DavPath, tm: SystemTime) -> FsFuture<'a, ()> {
        self.inner.set_modified(path, tm)
    }

    fn have_props<'a>(&'a self, path: &'a DavPath) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        self.inner.have_props(path)
    }
}
