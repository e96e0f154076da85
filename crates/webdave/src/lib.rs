//! WebDAV gateway over a local directory.
//!
//! The gateway serves one directory tree over WebDAV. Requests pass through
//! an optional HTTP Basic [`auth::BasicAuthGate`], then `dav_server`'s
//! protocol engine, which calls into an audited, metadata-caching view of
//! the directory built by [`build_filesystem`]:
//!
//! ```text
//! request -> BasicAuthGate -> DavHandler -> AuditFs -> CachedFs -> LocalFs
//! ```
//!
//! Process identity is lowered once at startup by [`privilege::deescalate`],
//! before the runtime or any listener exists.
//!
//! # Example
//!
//! ```ignore
//! use webdave::{build_filesystem, ServerConfig, WebDavServer};
//!
//! let fs = build_filesystem(std::path::Path::new("/srv/dav"));
//! let server = WebDavServer::start(fs, ServerConfig::default()).await?;
//! println!("serving at {}", server.url());
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod privilege;
pub mod server;

pub use auth::{AuthOutcome, BasicAuthGate, Credentials};
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use privilege::{Identity, PrivilegeError};
pub use server::{build_filesystem, GatewayFs, ServerConfig, WebDavServer};
