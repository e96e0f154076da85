//! Audit logging filesystem layer.
//!
//! [`AuditFs`] forwards every call unchanged and emits one `tracing` event per
//! completed operation on the [`AUDIT_TARGET`] target, carrying the operation
//! name, the path(s), the parameters and the outcome. It is an observer only:
//! results are returned exactly as the wrapped filesystem produced them.

use dav_server::davpath::DavPath;
use dav_server::fs::{
    DavDirEntry, DavFile, DavFileSystem, DavMetaData, FsFuture, FsResult, FsStream, OpenOptions,
    ReadDirMeta,
};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::SystemTime;
use tracing::info;

/// Tracing target for audit records.
pub const AUDIT_TARGET: &str = "webdave::audit";

/// Renders a result as `ok` or `error: <kind>`.
struct Outcome<'r, T>(&'r FsResult<T>);

impl<T> fmt::Display for Outcome<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Ok(_) => f.write_str("ok"),
            Err(e) => write!(f, "error: {e:?}"),
        }
    }
}

/// Filesystem wrapper that records each operation and its result.
#[derive(Clone)]
pub struct AuditFs<F> {
    inner: F,
}

impl<F> AuditFs<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    /// The wrapped filesystem.
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

impl<F: DavFileSystem + Clone + Send + Sync + 'static> DavFileSystem for AuditFs<F> {
    fn open<'a>(&'a self, path: &'a DavPath, options: OpenOptions) -> FsFuture<'a, Box<dyn DavFile>> {
        Box::pin(async move {
            let result = self.inner.open(path, options.clone()).await;
            info!(
                target: AUDIT_TARGET,
                op = "open",
                path = %path.as_url_string(),
                options = ?options,
                result = %Outcome(&result),
                "filesystem operation"
            );
            result
        })
    }

    fn read_dir<'a>(
        &'a self,
        path: &'a DavPath,
        meta: ReadDirMeta,
    ) -> FsFuture<'a, FsStream<Box<dyn DavDirEntry>>> {
        Box::pin(async move {
            let result = self.inner.read_dir(path, meta).await;
            info!(
                target: AUDIT_TARGET,
                op = "read_dir",
                path = %path.as_url_string(),
                result = %Outcome(&result),
                "filesystem operation"
            );
            result
        })
    }

    fn metadata<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Box<dyn DavMetaData>> {
        Box::pin(async move {
            let result = self.inner.metadata(path).await;
            match &result {
                Ok(meta) => info!(
                    target: AUDIT_TARGET,
                    op = "stat",
                    path = %path.as_url_string(),
                    len = meta.len(),
                    is_dir = meta.is_dir(),
                    result = "ok",
                    "filesystem operation"
                ),
                Err(_) => info!(
                    target: AUDIT_TARGET,
                    op = "stat",
                    path = %path.as_url_string(),
                    result = %Outcome(&result),
                    "filesystem operation"
                ),
            }
            result
        })
    }

    fn symlink_metadata<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, Box<dyn DavMetaData>> {
        Box::pin(async move {
            let result = self.inner.symlink_metadata(path).await;
            info!(
                target: AUDIT_TARGET,
                op = "lstat",
                path = %path.as_url_string(),
                result = %Outcome(&result),
                "filesystem operation"
            );
            result
        })
    }

    fn create_dir<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.create_dir(path).await;
            info!(
                target: AUDIT_TARGET,
                op = "mkdir",
                path = %path.as_url_string(),
                result = %Outcome(&result),
                "filesystem operation"
            );
            result
        })
    }

    fn remove_dir<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.remove_dir(path).await;
            info!(
                target: AUDIT_TARGET,
                op = "remove_dir",
                path = %path.as_url_string(),
                result = %Outcome(&result),
                "filesystem operation"
            );
            result
        })
    }

    fn remove_file<'a>(&'a self, path: &'a DavPath) -> FsFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.remove_file(path).await;
            info!(
                target: AUDIT_TARGET,
                op = "remove_file",
                path = %path.as_url_string(),
                result = %Outcome(&result),
                "filesystem operation"
            );
            result
        })
    }

    fn rename<'a>(&'a self, from: &'a DavPath, to: &'a DavPath) -> FsFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.rename(from, to).await;
            info!(
                target: AUDIT_TARGET,
                op = "rename",
                from = %from.as_url_string(),
                to = %to.as_url_string(),
                result = %Outcome(&result),
                "filesystem operation"
            );
            result
        })
    }

    fn copy<'a>(&'a self, from: &'a DavPath, to: &'a DavPath) -> FsFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.copy(from, to).await;
            info!(
                target: AUDIT_TARGET,
                op = "copy",
                from = %from.as_url_string(),
                to = %to.as_url_string(),
                result = %Outcome(&result),
                "filesystem operation"
            );
            result
        })
    }

    fn set_accessed<'a>(&'a self, path: &'a DavPath, tm: SystemTime) -> FsFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.set_accessed(path, tm).await;
            info!(
                target: AUDIT_TARGET,
                op = "set_accessed",
                path = %path.as_url_string(),
                result = %Outcome(&result),
                "filesystem operation"
            );
            result
        })
    }

    fn set_modified<'a>(&'a self, path: &'a DavPath, tm: SystemTime) -> FsFuture<'a, ()> {
        Box::pin(async move {
            let result = self.inner.set_modified(path, tm).await;
            info!(
                target: AUDIT_TARGET,
                op = "set_modified",
                path = %path.as_url_string(),
                result = %Outcome(&result),
                "filesystem operation"
            );
            result
        })
    }

    fn have_props<'a>(&'a self, path: &'a DavPath) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        self.inner.have_props(path)
    }
}
