//! One-time process identity change before serving.
//!
//! Must run before the tokio runtime is built and before any listener is
//! bound. The group is changed first: once the user id is dropped the
//! process usually no longer has the right to change its group. When running
//! as root, supplementary groups are reduced to the target group before that,
//! otherwise root's groups would survive the switch.

#[cfg(unix)]
use nix::unistd::{getgid, getuid, setgid, setuid, Gid, Uid};
use thiserror::Error;
#[cfg(unix)]
use tracing::info;

/// Failure to assume the requested identity. Always fatal.
#[derive(Debug, Error)]
pub enum PrivilegeError {
    #[cfg(unix)]
    #[error("Failed to set supplementary groups to [{gid}]: {source}")]
    SetGroups {
        gid: u32,
        #[source]
        source: nix::Error,
    },

    #[cfg(unix)]
    #[error("Failed to set gid to {gid}: {source}")]
    SetGid {
        gid: u32,
        #[source]
        source: nix::Error,
    },

    #[cfg(unix)]
    #[error("Failed to set uid to {uid}: {source}")]
    SetUid {
        uid: u32,
        #[source]
        source: nix::Error,
    },

    #[cfg(not(unix))]
    #[error("Changing uid/gid is not supported on this platform")]
    Unsupported,
}

/// Target identity. `None` and `Some(0)` both mean "leave unchanged".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

impl Identity {
    pub fn new(uid: Option<u32>, gid: Option<u32>) -> Self {
        Self { uid, gid }
    }

    fn target_uid(&self) -> Option<u32> {
        self.uid.filter(|&uid| uid != 0)
    }

    fn target_gid(&self) -> Option<u32> {
        self.gid.filter(|&gid| gid != 0)
    }

    /// Whether [`deescalate`] would attempt any change.
    pub fn is_noop(&self) -> bool {
        self.target_uid().is_none() && self.target_gid().is_none()
    }
}

/// Switch to the configured group and user ids.
#[cfg(unix)]
pub fn deescalate(identity: &Identity) -> Result<(), PrivilegeError> {
    if let Some(gid) = identity.target_gid() {
        if Uid::effective().is_root() {
            drop_supplementary_groups(gid)?;
        }
        setgid(Gid::from_raw(gid)).map_err(|source| PrivilegeError::SetGid { gid, source })?;
        info!(gid, "GID set");
    }

    if let Some(uid) = identity.target_uid() {
        setuid(Uid::from_raw(uid)).map_err(|source| PrivilegeError::SetUid { uid, source })?;
        info!(uid, "UID set");
    }

    Ok(())
}

/// Switch to the configured group and user ids.
#[cfg(not(unix))]
pub fn deescalate(identity: &Identity) -> Result<(), PrivilegeError> {
    if identity.is_noop() {
        Ok(())
    } else {
        Err(PrivilegeError::Unsupported)
    }
}

#[cfg(all(unix, not(target_vendor = "apple")))]
fn drop_supplementary_groups(gid: u32) -> Result<(), PrivilegeError> {
    nix::unistd::setgroups(&[Gid::from_raw(gid)])
        .map_err(|source| PrivilegeError::SetGroups { gid, source })?;
    info!(gid, "Supplementary groups set");
    Ok(())
}

// nix has no setgroups for Apple targets.
#[cfg(target_vendor = "apple")]
fn drop_supplementary_groups(_gid: u32) -> Result<(), PrivilegeError> {
    Ok(())
}

/// Current real (uid, gid) of the process.
#[cfg(unix)]
pub fn current_ids() -> (u32, u32) {
    (getuid().as_raw(), getgid().as_raw())
}
