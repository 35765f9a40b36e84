//! Startup orchestration.
//!
//! # Order
//! 1. Load the host file and seed the registry (every host Down)
//! 2. Install the metrics exporter, if enabled
//! 3. Bind both listeners
//! 4. Serve until a shutdown signal; the poller starts with the servers
//!
//! Any startup error is fatal.

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::RedirectorConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::registry::{HostRegistry, HostStore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read hosts file {path}: {source}")]
    HostsFile {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the registry from the configured host file.
pub fn build_registry(config: &RedirectorConfig) -> Result<HostRegistry, StartupError> {
    if config.hosts_file.path.is_empty() {
        tracing::info!("Host persistence disabled");
        return Ok(HostRegistry::new(None));
    }

    let store = HostStore::new(&config.hosts_file.path);
    HostRegistry::load(store).map_err(|source| StartupError::HostsFile {
        path: config.hosts_file.path.clone(),
        source,
    })
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Start everything and block until shutdown completes.
pub async fn run(config: RedirectorConfig) -> Result<(), StartupError> {
    let registry = Arc::new(build_registry(&config)?);
    tracing::info!(hosts = registry.len(), "Registry initialized");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = bind(&config.listener.bind_address).await?;
    let api_listener = bind(&config.api.bind_address).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on(signals::shutdown_signal());

    let server = HttpServer::new(config, registry)?;
    server.run(listener, api_listener, shutdown.subscribe()).await?;
    Ok(())
}
