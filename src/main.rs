//! xAI API proxy.
//!
//! ```text
//!     Client Request                        ┌───────────────────────────────┐
//!     ──────────────────────────────────────▶  cors (OPTIONS → 204)         │
//!                                           │      │                        │
//!                                           │      ▼                        │
//!                                           │  routing::resolver            │
//!                                           │  /foo → /v1/foo               │
//!                                           │      │                        │
//!                                           │      ▼                        │
//!                                           │  http::relay ─────────────────┼──▶ api.xai.com/v1
//!                                           │      │                        │
//!     Client Response                       │      ▼                        │
//!     ◀─────────────────────────────────────┼  + CORS headers               │
//!                                           └───────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use xai_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use xai_proxy::lifecycle::{signals, Shutdown};
use xai_proxy::observability::{init_logging, init_metrics};
use xai_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "xai-proxy")]
#[command(about = "Forwarding proxy for the xAI API with permissive CORS", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "XAI_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override upstream.base_url.
    #[arg(short, long)]
    upstream: Option<String>,
}

impl Cli {
    fn load(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(upstream) = &self.upstream {
            config.upstream.base_url = upstream.clone();
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    init_logging(&config.observability)?;

    tracing::info!("xai-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        allowed_origins = ?config.cors.allowed_origins,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_shutdown().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
