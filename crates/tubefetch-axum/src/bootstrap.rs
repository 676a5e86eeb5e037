//! Axum server bootstrap - the composition root.
//!
//! This module is the only place where the progress bus, the job runner and
//! the media fetcher are wired together for the web adapter.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, ensure};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tubefetch_core::{
    DEFAULT_BUS_CAPACITY, DEFAULT_IDLE_WINDOW, JobRunner, JobRunnerConfig, MediaFetcher,
    ProgressBus, resolve_download_dir,
};

/// Default bind address (all interfaces).
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8000;

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: IpAddr,
    /// Port for the HTTP server.
    pub port: u16,
    /// Directory holding `index.html`.
    pub templates_dir: PathBuf,
    /// Directory served under `/static/`.
    pub static_dir: PathBuf,
    /// Download directory override; `None` uses the platform default.
    pub download_dir: Option<PathBuf>,
    /// Idle window after which `/progress` observers get a keep-alive frame.
    pub keepalive: Duration,
    /// Events buffered per observer before it is disconnected.
    pub bus_capacity: usize,
}

impl ServerConfig {
    /// Create config with the default address, port and relative asset directories.
    pub fn with_defaults() -> Self {
        Self {
            host: DEFAULT_HOST,
            port: DEFAULT_PORT,
            templates_dir: PathBuf::from("templates"),
            static_dir: PathBuf::from("static"),
            download_dir: None,
            keepalive: DEFAULT_IDLE_WINDOW,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_templates_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.templates_dir = path.into();
        self
    }

    #[must_use]
    pub fn with_static_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_dir = path.into();
        self
    }

    /// Override the download directory.
    #[must_use]
    pub fn with_download_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_keepalive(mut self, keepalive: Duration) -> Self {
        self.keepalive = keepalive;
        self
    }

    #[must_use]
    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Application context for the Axum adapter.
pub struct AppContext {
    /// Launches download jobs.
    pub runner: JobRunner,
    /// Process-wide progress bus the runner publishes into.
    pub bus: ProgressBus,
    /// Directory holding `index.html`.
    pub templates_dir: PathBuf,
    /// Directory served under `/static/`.
    pub static_dir: PathBuf,
}

/// Wire the bus, runner and fetcher together.
pub async fn bootstrap(config: &ServerConfig, fetcher: Arc<dyn MediaFetcher>) -> Result<AppContext> {
    ensure!(config.bus_capacity > 0, "bus capacity must be at least 1");
    ensure!(!config.keepalive.is_zero(), "keep-alive interval must be non-zero");

    // Resolution happens again per job; this only surfaces problems early.
    match resolve_download_dir(config.download_dir.as_deref()) {
        Ok(dir) => info!(
            target: "tubefetch.paths",
            download_dir = %dir.display(),
            templates_dir = %config.templates_dir.display(),
            static_dir = %config.static_dir.display(),
            "Axum bootstrap resolved paths"
        ),
        Err(e) => warn!(
            target: "tubefetch.paths",
            error = %e,
            "Download directory is not usable yet; jobs will fail until it is"
        ),
    }

    if !tokio::fs::try_exists(config.templates_dir.join("index.html"))
        .await
        .unwrap_or(false)
    {
        warn!(
            target: "tubefetch.paths",
            templates_dir = %config.templates_dir.display(),
            "index.html not found; GET / will return 500"
        );
    }

    let bus = ProgressBus::new(config.bus_capacity, config.keepalive);
    let runner = JobRunner::new(
        fetcher,
        Arc::new(bus.clone()),
        JobRunnerConfig::new(config.download_dir.clone()),
    );

    Ok(AppContext {
        runner,
        bus,
        templates_dir: config.templates_dir.clone(),
        static_dir: config.static_dir.clone(),
    })
}

/// Serve `ctx` on `listener` until `cancel` fires.
///
/// On cancellation the progress bus is shut down so open `/progress`
/// streams end and graceful shutdown can complete.
pub async fn serve(listener: TcpListener, ctx: AppContext, cancel: CancellationToken) -> Result<()> {
    let bus = ctx.bus.clone();
    let app = crate::routes::create_router(ctx);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
            bus.shutdown();
        })
        .await?;

    info!("tubefetch web server shut down");
    Ok(())
}

/// Start the web server and run until Ctrl-C.
pub async fn start_server(config: ServerConfig, fetcher: Arc<dyn MediaFetcher>) -> Result<()> {
    let ctx = bootstrap(&config, fetcher).await?;

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("tubefetch web server listening on http://{}", listener.local_addr()?);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            info!("Ctrl-C received, shutting down");
            cancel.cancel();
        }
    });

    serve(listener, ctx, cancel).await
}
