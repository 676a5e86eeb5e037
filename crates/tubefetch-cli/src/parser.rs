//! Main CLI parser.
//!
//! Every option can also be set through the environment (or a `.env` file).

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tubefetch_axum::{DEFAULT_HOST, DEFAULT_PORT, ServerConfig};
use tubefetch_core::DEFAULT_BUS_CAPACITY;

/// Command-line interface definition for the tubefetch server.
#[derive(Parser, Debug)]
#[command(name = "tubefetch")]
#[command(about = "Local web front end for downloading online videos with yt-dlp")]
#[command(version)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "TUBEFETCH_HOST", default_value_t = DEFAULT_HOST)]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "TUBEFETCH_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory containing index.html
    #[arg(long = "templates-dir", env = "TUBEFETCH_TEMPLATES_DIR", default_value = "templates")]
    pub templates_dir: PathBuf,

    /// Directory served under /static/
    #[arg(long = "static-dir", env = "TUBEFETCH_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Where downloads are saved (default: ~/Downloads/YouTubeDownloads)
    #[arg(long = "download-dir", env = "TUBEFETCH_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Path to the yt-dlp executable (default: looked up on PATH)
    #[arg(long = "ytdlp-path", env = "TUBEFETCH_YTDLP")]
    pub ytdlp_path: Option<PathBuf>,

    /// Seconds without progress before observers get a keep-alive frame
    #[arg(
        long = "keepalive-secs",
        env = "TUBEFETCH_KEEPALIVE_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub keepalive_secs: u64,

    /// Progress events buffered per observer before it is disconnected
    #[arg(
        long = "bus-capacity",
        env = "TUBEFETCH_BUS_CAPACITY",
        default_value_t = DEFAULT_BUS_CAPACITY,
        value_parser = parse_capacity
    )]
    pub bus_capacity: usize,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Build the web server configuration.
    pub fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig::with_defaults()
            .with_host(self.host)
            .with_port(self.port)
            .with_templates_dir(&self.templates_dir)
            .with_static_dir(&self.static_dir)
            .with_keepalive(Duration::from_secs(self.keepalive_secs))
            .with_bus_capacity(self.bus_capacity);
        if let Some(dir) = &self.download_dir {
            config = config.with_download_dir(dir);
        }
        config
    }
}

fn parse_capacity(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("capacity must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
