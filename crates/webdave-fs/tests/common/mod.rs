//! Common test utilities for overlay integration tests.

#![allow(dead_code)]

use dav_server::davpath::DavPath;
use dav_server::fs::{
    DavDirEntry, DavFile, DavFileSystem, DavMetaData, FsFuture, FsStream, OpenOptions, ReadDirMeta,
};
use dav_server::localfs::LocalFs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use webdave_fs::CachedFs;

/// Backing filesystem that counts calls and can slow down stats.
///
/// Wraps a real `LocalFs` so the tests exercise the same backend the
/// gateway serves from.
#[derive(Clone)]
pub struct CountingFs {
    inner: Arc<LocalFs>,
    stat_calls: Arc<AtomicUsize>,
    remove_calls: Arc<AtomicUsize>,
    rename_calls: Arc<AtomicUsize>,
    /// Applied after the backend answered a stat and before it is returned.
    stat_delay: Option<Duration>,
}

impl CountingFs {
    pub fn new(root: &Path) -> Self {
        Self {
            inner: Arc::from(LocalFs::new(root, false, false, false)),
            stat_calls: Arc::new(AtomicUsize::new(0)),
            remove_calls: Arc::new(AtomicUsize::new(0)),
            rename_calls: Arc::new(AtomicUsize::new(0)),
            stat_delay: None,
        }
    }

    #[must_use]
    pub fn with_stat_delay(mut self, delay: Duration) -> Self {
        self.stat_delay = Some(delay);
        self
    }

    pub fn stat_calls(&self) -> usize {
        self.stat_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    pub fn rename_calls(&self) -> usize {
        self.rename_calls.load(Ordering::SeqCst)
    }
}

impl DavFileSystem for CountingFs {
    fn open<'a>(&'a self, path: &'a DavPath, options: OpenOptions) -> FsFuture<'a, Box<dyn DavFile>> {
        self.inner.open(path, options)
    }

    fn read_dir<'a>(
        &'a self,
        path: &'a DavPath,
        meta: ReadDirMeta,
    ) -> FsFuture<'a, FsStream<Box<dyn DavDirEntry>>> {
        self.inner.read_dir(path, meta)
    }

    fn metadata<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Box<dyn DavMetaData>> {
        Box::pin(async move {
            self.stat_calls.fetch_add(1, Ordering::SeqCst);
            let result = self.inner.metadata(path).await;
            if let Some(delay) = self.stat_delay {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }

    fn create_dir<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        self.inner.create_dir(path)
    }

    fn remove_dir<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_dir(path)
    }

    fn remove_file<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_file(path)
    }

    fn rename<'a>(&'a self, from: &'a DavPath, to: &'a DavPath) -> FsFuture<'a, ()> {
        self.rename_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.rename(from, to)
    }

    fn copy<'a>(&'a self, from: &'a DavPath, to: &'a DavPath) -> FsFuture<'a, ()> {
        self.inner.copy(from, to)
    }
}

/// A temporary served root with an overlay on top of a counting backend.
pub struct TestRoot {
    pub dir: TempDir,
    pub backend: Arc<CountingFs>,
    pub fs: CachedFs<CountingFs>,
}

impl TestRoot {
    pub fn new() -> Self {
        Self::build(|backend| backend)
    }

    pub fn with_stat_delay(delay: Duration) -> Self {
        Self::build(|backend| backend.with_stat_delay(delay))
    }

    fn build(configure: impl FnOnce(CountingFs) -> CountingFs) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let backend = Arc::new(configure(CountingFs::new(dir.path())));
        let fs = CachedFs::new(Arc::clone(&backend));
        Self { dir, backend, fs }
    }

    /// Absolute on-disk location of a served path.
    pub fn disk_path(&self, path: &str) -> PathBuf {
        self.dir.path().join(path.trim_start_matches('/'))
    }

    /// Write a file directly on disk, bypassing the overlay.
    pub fn write_file(&self, path: &str, content: &[u8]) {
        std::fs::write(self.disk_path(path), content).expect("Failed to write test file");
    }

    /// Create a directory directly on disk, bypassing the overlay.
    pub fn make_dir(&self, path: &str) {
        std::fs::create_dir_all(self.disk_path(path)).expect("Failed to create test dir");
    }
}

/// Parse a request path.
pub fn dav(path: &str) -> DavPath {
    DavPath::new(path).expect("valid DAV path")
}
