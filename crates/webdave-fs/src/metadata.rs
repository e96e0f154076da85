//! Owned metadata snapshots.
//!
//! The backing filesystem hands out `Box<dyn DavMetaData>` values whose
//! accessors may be lazy or fallible. [`MetaSnapshot`] copies every attribute
//! once so the cache can store and hand out the value cheaply.

use dav_server::fs::{DavMetaData, FsError};
use std::time::SystemTime;

/// A point-in-time copy of everything a stat exposes for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaSnapshot {
    /// Size in bytes (0 for directories on most backends).
    pub len: u64,
    /// Last modification time.
    pub modified: Option<SystemTime>,
    /// Creation time, if the backend reports it.
    pub created: Option<SystemTime>,
    /// Last access time, if the backend reports it.
    pub accessed: Option<SystemTime>,
    /// Last status change time, if the backend reports it.
    pub status_changed: Option<SystemTime>,
    pub is_dir: bool,
    pub is_file: bool,
    pub is_symlink: bool,
    /// Executable bit, if the backend reports it.
    pub executable: Option<bool>,
    /// Entity tag as computed by the backend.
    pub etag: Option<String>,
}

impl MetaSnapshot {
    /// Capture all attributes of a backend metadata value.
    pub fn capture(meta: &dyn DavMetaData) -> Self {
        Self {
            len: meta.len(),
            modified: meta.modified().ok(),
            created: meta.created().ok(),
            accessed: meta.accessed().ok(),
            status_changed: meta.status_changed().ok(),
            is_dir: meta.is_dir(),
            is_file: meta.is_file(),
            is_symlink: meta.is_symlink(),
            executable: meta.executable().ok(),
            etag: meta.etag(),
        }
    }

    /// Snapshot of a regular file with the given size and mtime.
    pub fn file(len: u64, modified: SystemTime) -> Self {
        Self {
            len,
            modified: Some(modified),
            created: None,
            accessed: None,
            status_changed: None,
            is_dir: false,
            is_file: true,
            is_symlink: false,
            executable: None,
            etag: None,
        }
    }

    /// Snapshot of a directory with the given mtime.
    pub fn directory(modified: SystemTime) -> Self {
        Self {
            len: 0,
            modified: Some(modified),
            created: None,
            accessed: None,
            status_changed: None,
            is_dir: true,
            is_file: false,
            is_symlink: false,
            executable: None,
            etag: None,
        }
    }
}

impl DavMetaData for MetaSnapshot {
    fn len(&self) -> u64 {
        self.len
    }

    fn modified(&self) -> Result<SystemTime, FsError> {
        self.modified.ok_or(FsError::GeneralFailure)
    }

    fn is_dir(&self) -> bool {
        self.is_dir
    }

    fn is_file(&self) -> bool {
        self.is_file
    }

    fn is_symlink(&self) -> bool {
        self.is_symlink
    }

    fn created(&self) -> Result<SystemTime, FsError> {
        self.created.ok_or(FsError::NotImplemented)
    }

    fn accessed(&self) -> Result<SystemTime, FsError> {
        self.accessed.ok_or(FsError::NotImplemented)
    }

    fn status_changed(&self) -> Result<SystemTime, FsError> {
        self.status_changed.ok_or(FsError::NotImplemented)
    }

    fn executable(&self) -> Result<bool, FsError> {
        self.executable.ok_or(FsError::NotImplemented)
    }

    fn etag(&self) -> Option<String> {
        self.etag.clone()
    }
}
