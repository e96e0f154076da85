//! HTTP server lifecycle management for the gateway.
//!
//! This module wires the filesystem stack into a `DavHandler`, puts the
//! optional credential gate in front of it and runs the accept loop.

use crate::auth::{BasicAuthGate, Credentials};
use dav_server::body::Body;
use dav_server::localfs::LocalFs;
use dav_server::memls::MemLs;
use dav_server::DavHandler;
use hyper::body::Incoming;
use hyper::header::CONTENT_LENGTH;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use webdave_fs::{AuditFs, CachedFs};

/// The filesystem stack handed to the protocol engine.
pub type GatewayFs = AuditFs<CachedFs<LocalFs>>;

/// Build the audited, cached view of `root`.
pub fn build_filesystem(root: &Path) -> GatewayFs {
    let backend: Arc<LocalFs> = Arc::from(LocalFs::new(root, false, false, false));
    AuditFs::new(CachedFs::new(backend))
}

/// Configuration for the WebDAV server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 = auto-assign).
    pub port: u16,
    /// Bind address.
    pub bind_address: std::net::IpAddr,
    /// URL prefix stripped before path resolution (`""` = none).
    pub prefix: String,
    /// Enables the credential gate.
    pub credentials: Option<Credentials>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 0, // Auto-assign
            bind_address: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            prefix: String::new(),
            credentials: None,
        }
    }
}

/// Credential gate plus DAV handler; one per server, shared by connections.
struct Gateway {
    dav: DavHandler,
    gate: Option<BasicAuthGate>,
}

impl Gateway {
    async fn handle(&self, req: Request<Incoming>) -> Response<Body> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let content_length = req
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        if let Some(gate) = &self.gate {
            if let Some(resp) = gate.check(req.headers()).rejection() {
                debug!(%method, %path, status = resp.status().as_u16(), "Request rejected");
                return resp;
            }
        }

        let resp = self.dav.handle(req).await;
        debug!(
            %method,
            %path,
            content_length,
            status = resp.status().as_u16(),
            "Request handled"
        );
        resp
    }
}

/// A running WebDAV server instance.
pub struct WebDavServer {
    /// The actual bound address.
    pub addr: SocketAddr,
    /// Shutdown signal sender.
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Server task handle.
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl WebDavServer {
    /// Start a new WebDAV server.
    pub async fn start(fs: GatewayFs, config: ServerConfig) -> Result<Self, std::io::Error> {
        let addr = SocketAddr::new(config.bind_address, config.port);
        let listener = TcpListener::bind(addr).await?;
        let actual_addr = listener.local_addr()?;

        info!(
            addr = %actual_addr,
            prefix = %config.prefix,
            auth = config.credentials.is_some(),
            "Starting WebDAV server"
        );

        let mut builder = DavHandler::builder()
            .filesystem(Box::new(fs))
            .locksystem(MemLs::new());
        if !config.prefix.is_empty() {
            builder = builder.strip_prefix(config.prefix);
        }

        let gateway = Arc::new(Gateway {
            dav: builder.build_handler(),
            gate: config.credentials.map(BasicAuthGate::new),
        });

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        // Spawn the server task
        let server_handle = tokio::spawn(async move {
            tokio::select! {
                () = run_server(listener, gateway) => {
                    debug!("Server loop ended");
                }
                _ = shutdown_rx => {
                    info!("Received shutdown signal");
                }
            }
        });

        Ok(Self {
            addr: actual_addr,
            shutdown_tx: Some(shutdown_tx),
            server_handle: Some(server_handle),
        })
    }

    /// Get the URL for this server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the server.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
        info!("WebDAV server stopped");
    }

    /// Stop the server synchronously (for use in Drop).
    fn stop_sync(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
    }
}

impl Drop for WebDavServer {
    fn drop(&mut self) {
        self.stop_sync();
    }
}

/// Run the server accept loop.
async fn run_server(listener: TcpListener, gateway: Arc<Gateway>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                let gateway = gateway.clone();
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req: Request<Incoming>| {
                        let gateway = gateway.clone();
                        async move { Ok::<_, Infallible>(gateway.handle(req).await) }
                    });

                    if let Err(e) = auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await
                    {
                        warn!(peer = %peer_addr, error = %e, "HTTP connection error");
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
            }
        }
    }
}
