//! Short URL redirect service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ http::request ──▶ routing::router
//!                    (axum, layers)   (host key,        (precedence chain,
//!                                      access key)        alias resolution)
//!                                                               │
//!                          ┌────────────────────────────────────┤
//!                          ▼                                    ▼
//!                   management handler                routing::redirect
//!                   (global / domain commands)        (query merge)
//!                          │                                    │
//!                          ▼                                    ▼
//!     ◀────────────── http::response (OtherResult / 301 / 302 Location)
//!
//!     settings::SettingsStore (ArcSwap snapshot) ◀── config::watcher, management
//! ```

use std::path::PathBuf;

use clap::Parser;

use short_url::config::load_config;
use short_url::lifecycle::startup;
use short_url::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "short-url")]
#[command(about = "Host and path based short URL redirect service", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Reload settings when the configuration file changes.
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    init_logging(&config.observability);
    tracing::info!("short-url v{} starting", env!("CARGO_PKG_VERSION"));

    let watch_path = args.watch.then_some(args.config.as_path());
    startup::run(config, watch_path).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
