//! CLI entry point - the composition root.
//!
//! Loads `.env`, parses arguments, installs logging, locates yt-dlp and runs
//! the web server until Ctrl-C.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tubefetch_axum::start_server;
use tubefetch_cli::Cli;
use tubefetch_ytdlp::{DEFAULT_PROGRAM, YtDlpFetcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before parsing so env fallbacks see it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let fetcher = match YtDlpFetcher::locate(cli.ytdlp_path.as_deref()) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            warn!(
                error = %e,
                "yt-dlp not found; downloads will fail until it is installed"
            );
            YtDlpFetcher::new(
                cli.ytdlp_path
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PROGRAM.into()),
            )
        }
    };
    info!(program = %fetcher.program().display(), "Using yt-dlp");

    start_server(cli.server_config(), Arc::new(fetcher)).await
}
