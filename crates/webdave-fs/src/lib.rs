//! Filesystem layers for the webdave gateway.
//!
//! This crate provides two wrappers around any [`dav_server::fs::DavFileSystem`]:
//!
//! - [`CachedFs`] - caches `metadata` (stat) results per path and drops an
//!   entry whenever a remove or rename of that exact path passes through it.
//! - [`AuditFs`] - records every filesystem operation and its outcome as a
//!   structured `tracing` event.
//!
//! Both present the same capability set as the filesystem they wrap, so they
//! stack freely and can be handed to `dav_server::DavHandler` directly.
//!
//! # Example
//!
//! ```ignore
//! use dav_server::localfs::LocalFs;
//! use std::sync::Arc;
//! use webdave_fs::{AuditFs, CachedFs};
//!
//! let backend: Arc<LocalFs> = Arc::from(LocalFs::new("/srv/dav", false, false, false));
//! let fs = AuditFs::new(CachedFs::new(backend));
//! ```
//!
//! # Capacity
//!
//! The cache has no eviction policy. Entries accumulate for the lifetime of
//! the overlay, one per distinct path that was successfully stat'ed and not
//! since removed or renamed away.
//! Each path ever removed or renamed away also keeps a small invalidation
//! stamp.

mod audit;
mod cache;
mod metadata;
mod overlay;
mod stats;

pub use audit::{AuditFs, AUDIT_TARGET};
pub use cache::{cache_key, Lookup, MetadataCache};
pub use metadata::MetaSnapshot;
pub use overlay::CachedFs;
pub use stats::{CacheStats, CacheStatsSnapshot};
