//! Exit codes for the gateway binary.
//!
//! These follow common Unix conventions so supervisors and container
//! runtimes can tell a misconfiguration from a runtime failure.

/// Clean shutdown
pub const SUCCESS: u8 = 0;

/// General/unspecified error
pub const GENERAL_ERROR: u8 = 1;

/// Invalid configuration (bad root, non-numeric ids)
pub const CONFIG_ERROR: u8 = 3;

/// Could not assume the requested uid/gid
pub const PRIVILEGE_ERROR: u8 = 4;
