//! Command line and environment configuration.

use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

use renderer::DEFAULT_TILE_SIZE;
use storage::DEFAULT_CACHE_MB;

#[derive(Parser, Debug, Clone)]
#[command(name = "heatmap-api")]
#[command(about = "Activity heatmap tile server")]
pub struct Args {
    /// Listen address
    #[arg(short, long, env = "HEATMAP_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long, env = "TOKIO_WORKER_THREADS")]
    pub worker_threads: Option<usize>,

    /// Rendered tile cache budget in MiB
    #[arg(long, env = "TILE_CACHE_MB", default_value_t = DEFAULT_CACHE_MB)]
    pub tile_cache_mb: usize,

    /// Tile edge in pixels
    #[arg(
        long,
        env = "TILE_SIZE",
        default_value_t = DEFAULT_TILE_SIZE,
        value_parser = parse_tile_size
    )]
    pub tile_size: usize,

    /// JSON file of tracks to load at startup
    #[arg(long, env = "TRACKS_FILE")]
    pub tracks_file: Option<PathBuf>,
}

impl Args {
    pub fn tracing_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn parse_tile_size(s: &str) -> Result<usize, String> {
    let size: usize = s.parse().map_err(|e| format!("{}", e))?;
    if !(16..=4096).contains(&size) {
        return Err(format!("tile size must be within 16..=4096, got {}", size));
    }
    Ok(size)
}
