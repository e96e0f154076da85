//! Error types for the gateway.
//!
//! Filesystem errors never appear here: they travel as
//! [`dav_server::fs::FsError`] from the backing filesystem, through the
//! cache overlay untouched, to the protocol engine which maps them to HTTP
//! status codes.

use crate::privilege::PrivilegeError;
use std::io;
use thiserror::Error;

/// Errors that stop the gateway from starting or serving.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Changing the process identity failed.
    #[error(transparent)]
    Privilege(#[from] PrivilegeError),

    /// IO error (binding the listener, reading the root).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
