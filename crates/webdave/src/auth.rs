//! HTTP Basic credential gate.
//!
//! The gate sits in front of the DAV handler and holds a single
//! username/password pair. It keeps no state between requests.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dav_server::body::Body;
use hyper::header::{HeaderValue, AUTHORIZATION, WWW_AUTHENTICATE};
use hyper::{HeaderMap, Response, StatusCode};
use std::fmt;
use tracing::{debug, warn};

/// Challenge sent with every `401 Unauthorized`.
pub const CHALLENGE: &str = "Basic realm=\"WebDAV\", charset=\"UTF-8\"";

/// The single accepted username/password pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Build credentials only when both parts are present and non-empty.
    pub fn from_parts(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some(Self::new(u, p)),
            _ => None,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of checking one request against the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Credentials match; forward the request.
    Granted,
    /// No usable `Authorization: Basic` header.
    Missing,
    /// A pair was supplied but does not match.
    Invalid,
}

impl AuthOutcome {
    /// The response to send instead of forwarding, if any.
    pub fn rejection(self) -> Option<Response<Body>> {
        match self {
            Self::Granted => None,
            Self::Missing => {
                let mut resp = Response::new(Body::from("401 Unauthorized\n".to_string()));
                *resp.status_mut() = StatusCode::UNAUTHORIZED;
                resp.headers_mut()
                    .insert(WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE));
                Some(resp)
            }
            Self::Invalid => {
                let mut resp = Response::new(Body::from("403 Forbidden\n".to_string()));
                *resp.status_mut() = StatusCode::FORBIDDEN;
                Some(resp)
            }
        }
    }
}

/// Stateless Basic authentication check.
#[derive(Debug, Clone)]
pub struct BasicAuthGate {
    credentials: Credentials,
}

impl BasicAuthGate {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Check a request's headers.
    pub fn check(&self, headers: &HeaderMap) -> AuthOutcome {
        let Some((username, password)) = headers.get(AUTHORIZATION).and_then(parse_basic) else {
            warn!("Authentication failed, missing basic authentication");
            return AuthOutcome::Missing;
        };

        if self.credentials.matches(&username, &password) {
            debug!(username = %username, "Authentication succeeded");
            AuthOutcome::Granted
        } else {
            warn!(username = %username, "Authentication failed, invalid username or password");
            AuthOutcome::Invalid
        }
    }
}

/// Decode an `Authorization: Basic <base64(user:pass)>` header value.
///
/// The scheme name is matched case-insensitively. Returns `None` for any
/// other scheme, bad base64, non-UTF-8 content or a missing `:`.
pub fn parse_basic(value: &HeaderValue) -> Option<(String, String)> {
    let value = value.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
