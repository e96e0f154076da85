//! Validated gateway configuration.

use crate::auth::Credentials;
use crate::error::{GatewayError, GatewayResult};
use crate::privilege::Identity;
use crate::server::ServerConfig;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use tracing::warn;

/// Default served root.
pub const DEFAULT_ROOT: &str = "/dav";

/// Default listening port.
pub const DEFAULT_PORT: u16 = 5000;

/// Everything the gateway needs to start, already validated.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Directory served as `/`.
    pub root: PathBuf,
    /// URL prefix stripped from every request path (`""` or `/x`).
    pub prefix: String,
    /// Basic auth pair; `None` disables the gate.
    pub credentials: Option<Credentials>,
    /// Identity to assume before serving.
    pub identity: Identity,
    pub port: u16,
    pub bind_address: IpAddr,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            prefix: String::new(),
            credentials: None,
            identity: Identity::default(),
            port: DEFAULT_PORT,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

impl GatewayConfig {
    /// Set credentials from optional raw parts.
    ///
    /// The gate is only enabled when both parts are non-empty. Supplying just
    /// one of them is almost certainly a mistake, so it is logged.
    #[must_use]
    pub fn with_credentials(mut self, username: Option<&str>, password: Option<&str>) -> Self {
        self.credentials = Credentials::from_parts(username, password);
        let given = |s: Option<&str>| s.is_some_and(|s| !s.is_empty());
        if self.credentials.is_none() && (given(username) || given(password)) {
            warn!("Only one of username/password is set, authentication is disabled");
        }
        self
    }

    /// Check that the root is an existing directory.
    pub fn validate(&self) -> GatewayResult<()> {
        let meta = std::fs::metadata(&self.root).map_err(|e| {
            GatewayError::Config(format!("root {} is not accessible: {e}", self.root.display()))
        })?;
        if !meta.is_dir() {
            return Err(GatewayError::Config(format!(
                "root {} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }

    /// Listener settings for [`crate::WebDavServer::start`].
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            port: self.port,
            bind_address: self.bind_address,
            prefix: self.prefix.clone(),
            credentials: self.credentials.clone(),
        }
    }
}

/// Normalize a URL prefix to `""` or `/a/b` (leading slash, no trailing one).
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Parse a uid/gid value. Empty means "not configured".
pub fn parse_id(raw: Option<&str>, name: &str) -> GatewayResult<Option<u32>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<u32>()
        .map(Some)
        .map_err(|e| GatewayError::Config(format!("{name} {raw:?} is not a numeric id: {e}")))
}
