//! Test server harness for gateway integration tests.
//!
//! Provides a `TestServer` that runs the full gateway stack over a
//! temporary directory, along with HTTP convenience methods.

#![allow(dead_code)]

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use webdave::{build_filesystem, Credentials, ServerConfig, WebDavServer};
use webdave_fs::CacheStats;

/// Username for gated test servers.
pub const TEST_USER: &str = "bob";

/// Password for gated test servers.
pub const TEST_PASSWORD: &str = "secret";

/// Test server with HTTP client and automatic cleanup.
pub struct TestServer {
    /// The running gateway.
    server: WebDavServer,
    /// HTTP client for making requests.
    client: Client,
    /// Base URL including the prefix.
    pub base_url: String,
    /// Counters of the served filesystem's metadata cache.
    pub stats: Arc<CacheStats>,
    /// Served root (cleaned up on drop).
    root: TempDir,
    /// Sent with every request made through [`TestServer::request`].
    auth: Option<(String, String)>,
}

impl TestServer {
    /// Start an open server (no credentials, no prefix).
    pub async fn new() -> Self {
        Self::start(ServerConfig::default(), None).await
    }

    /// Start a server gated by `bob`/`secret`; requests carry those credentials.
    pub async fn with_auth() -> Self {
        let config = ServerConfig {
            credentials: Some(Credentials::new(TEST_USER, TEST_PASSWORD)),
            ..ServerConfig::default()
        };
        Self::start(config, Some((TEST_USER.to_string(), TEST_PASSWORD.to_string()))).await
    }

    /// Start an open server mounted under `prefix`.
    pub async fn with_prefix(prefix: &str) -> Self {
        let config = ServerConfig {
            prefix: prefix.to_string(),
            ..ServerConfig::default()
        };
        Self::start(config, None).await
    }

    async fn start(config: ServerConfig, auth: Option<(String, String)>) -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        let fs = build_filesystem(root.path());
        let stats = fs.inner().stats();

        let prefix = config.prefix.clone();
        let server = WebDavServer::start(fs, config)
            .await
            .expect("Failed to start WebDAV server");
        let base_url = format!("{}{}", server.url(), prefix);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        let test_server = Self {
            server,
            client,
            base_url,
            stats,
            root,
            auth,
        };

        test_server.wait_ready().await;
        test_server
    }

    /// Wait for the server to be ready to accept connections.
    async fn wait_ready(&self) {
        for _ in 0..50 {
            if let Ok(resp) = self.propfind_request("/", "0").send().await {
                if resp.status() == StatusCode::MULTI_STATUS || resp.status().is_success() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("Server did not become ready in time");
    }

    /// Build a full URL from a path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// On-disk location of a served path.
    pub fn disk_path(&self, path: &str) -> PathBuf {
        self.root.path().join(path.trim_start_matches('/'))
    }

    /// Write a file directly on disk, bypassing the gateway.
    pub fn write_on_disk(&self, path: &str, content: &[u8]) {
        std::fs::write(self.disk_path(path), content).expect("Failed to write test file");
    }

    // ========== HTTP Convenience Methods ==========

    /// Request carrying the harness credentials, if any.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.auth {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    /// Request without any credentials.
    pub fn anonymous(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    fn propfind_request(&self, path: &str, depth: &str) -> RequestBuilder {
        self.request(propfind_method(), path).header("Depth", depth)
    }

    /// PROPFIND with the given depth.
    pub async fn propfind(&self, path: &str, depth: &str) -> Response {
        self.propfind_request(path, depth)
            .send()
            .await
            .expect("PROPFIND request failed")
    }

    /// PROPFIND and return status plus body text.
    pub async fn propfind_body(&self, path: &str, depth: &str) -> (StatusCode, String) {
        let resp = self.propfind(path, depth).await;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        (status, body)
    }

    /// GET a file.
    pub async fn get(&self, path: &str) -> Response {
        self.request(Method::GET, path)
            .send()
            .await
            .expect("GET request failed")
    }

    /// PUT file contents.
    pub async fn put(&self, path: &str, body: impl Into<reqwest::Body>) -> Response {
        self.request(Method::PUT, path)
            .body(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    /// PUT file contents and assert success.
    pub async fn put_ok(&self, path: &str, body: impl Into<reqwest::Body>) {
        let resp = self.put(path, body).await;
        let status = resp.status();
        assert!(
            status.is_success(),
            "PUT {} failed with status {}: {}",
            path,
            status,
            resp.text().await.unwrap_or_default()
        );
    }

    /// DELETE a file or directory.
    pub async fn delete(&self, path: &str) -> Response {
        self.request(Method::DELETE, path)
            .send()
            .await
            .expect("DELETE request failed")
    }

    /// MKCOL a directory.
    pub async fn mkcol(&self, path: &str) -> Response {
        self.request(Method::from_bytes(b"MKCOL").unwrap(), path)
            .send()
            .await
            .expect("MKCOL request failed")
    }

    /// MOVE a resource, overwriting the destination.
    pub async fn move_to(&self, from: &str, to: &str) -> Response {
        self.request(Method::from_bytes(b"MOVE").unwrap(), from)
            .header("Destination", self.url(to))
            .header("Overwrite", "T")
            .send()
            .await
            .expect("MOVE request failed")
    }

    /// Stop the server explicitly.
    pub async fn stop(self) {
        self.server.stop().await;
    }
}

pub fn propfind_method() -> Method {
    Method::from_bytes(b"PROPFIND").unwrap()
}
