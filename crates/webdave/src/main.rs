#![deny(unsafe_code)]

mod exit_code;

use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use webdave::config::{self, normalize_prefix, parse_id};
use webdave::privilege;
use webdave::{build_filesystem, GatewayConfig, GatewayError, Identity, WebDavServer};

/// Serve a directory over WebDAV
#[derive(Parser)]
#[command(name = "webdave")]
#[command(author, version)]
#[command(after_help = "EXAMPLES:
    # Serve /srv/files on port 5000
    webdave --root /srv/files

    # Require credentials and drop to uid/gid 1000
    USERNAME=bob PASSWORD=secret PUID=1000 PGID=1000 webdave

    # Serve under http://host:8080/dav/
    webdave --root /srv/files --prefix /dav --port 8080")]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory to serve
    #[arg(long, env = "ROOT", default_value = config::DEFAULT_ROOT)]
    root: PathBuf,

    /// URL prefix stripped from request paths
    #[arg(long, env = "PREFIX", default_value = "")]
    prefix: String,

    /// Username for HTTP Basic authentication
    #[arg(long, env = "USERNAME")]
    username: Option<String>,

    /// Password for HTTP Basic authentication
    #[arg(long, env = "PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// User id to switch to before serving (0 or empty = keep)
    #[arg(long, env = "PUID")]
    puid: Option<String>,

    /// Group id to switch to before serving (0 or empty = keep)
    #[arg(long, env = "PGID")]
    pgid: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = config::DEFAULT_PORT)]
    port: u16,

    /// Address to listen on
    #[arg(long = "bind", env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    bind_address: IpAddr,
}

impl Cli {
    fn into_config(self) -> Result<GatewayConfig, GatewayError> {
        let identity = Identity::new(
            parse_id(self.puid.as_deref(), "PUID")?,
            parse_id(self.pgid.as_deref(), "PGID")?,
        );

        let config = GatewayConfig {
            root: self.root,
            prefix: normalize_prefix(&self.prefix),
            credentials: None,
            identity,
            port: self.port,
            bind_address: self.bind_address,
        }
        .with_credentials(self.username.as_deref(), self.password.as_deref());

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(categorize_error(&e))
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let config = cli.into_config()?;

    // No threads exist yet, so the identity change covers the whole process.
    privilege::deescalate(&config.identity)
        .map_err(GatewayError::from)
        .context("Failed to change process identity")?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    runtime.block_on(serve(config))
}

async fn serve(config: GatewayConfig) -> Result<()> {
    let fs = build_filesystem(&config.root);
    let stats = fs.inner().stats();

    let server = WebDavServer::start(fs, config.server_config())
        .await
        .with_context(|| format!("Failed to listen on {}:{}", config.bind_address, config.port))?;

    #[cfg(unix)]
    {
        let (uid, gid) = privilege::current_ids();
        info!(
            addr = %server.addr,
            root = %config.root.display(),
            uid,
            gid,
            "starting webdave server"
        );
    }
    #[cfg(not(unix))]
    info!(addr = %server.addr, root = %config.root.display(), "starting webdave server");

    shutdown_signal().await;
    server.stop().await;

    let snapshot = stats.snapshot();
    info!(
        hits = snapshot.hits,
        misses = snapshot.misses,
        entries = snapshot.entries,
        invalidations = snapshot.invalidations,
        hit_rate = snapshot.hit_rate(),
        "Metadata cache statistics"
    );
    Ok(())
}

/// Wait for Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

/// Categorize an error into an exit code using typed error downcasting
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(gateway_err) = cause.downcast_ref::<GatewayError>() {
            match gateway_err {
                GatewayError::Config(_) => return exit_code::CONFIG_ERROR,
                GatewayError::Privilege(_) => return exit_code::PRIVILEGE_ERROR,
                GatewayError::Io(_) => {}
            }
        }
    }

    exit_code::GENERAL_ERROR
}
