//! tmpnb redirector.
//!
//! Redirects each incoming request to one of several notebook hosts, picked
//! at random with each host's spare capacity as its weight.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!   GET /<path>       │  ┌────────┐    ┌──────────────┐              │
//!  ───────────────────┼─▶│  http  │───▶│load_balancer │              │
//!   302 <host>/<path> │  │ server │◀───│  (weighted)  │              │
//!  ◀──────────────────┼──└────────┘    └──────┬───────┘              │
//!                     │                       │ snapshot             │
//!   POST/DELETE /hosts│  ┌────────┐    ┌──────▼───────┐   GET /stats │
//!  ───────────────────┼─▶│ admin  │───▶│   registry   │◀─────────────┼── targets
//!                     │  └────────┘    └──────▲───────┘   (poller)   │
//!                     │                       │ host file            │
//!                     └──────────────────────────────────────────────┘
//! ```
//!
//! Add a host:
//!
//! ```text
//! curl -X POST -d '{"host": "https://tmpnb.org"}' http://127.0.0.1:9001/hosts
//! ```

use std::path::PathBuf;

use clap::Parser;

use tmpnb_redirector::config::{load_config, validate_config, ConfigError, RedirectorConfig};
use tmpnb_redirector::lifecycle::startup;
use tmpnb_redirector::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "tmpnb-redirector", version, about = "Capacity-weighted redirect service")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for the redirect server to listen on.
    #[arg(long)]
    port: Option<u16>,

    /// Port for the hosts API.
    #[arg(long)]
    api_port: Option<u16>,

    /// IP address for the hosts API.
    #[arg(long)]
    api_ip: Option<String>,

    /// Interval (s) for checking capacity of hosts.
    #[arg(long)]
    stats_period: Option<u64>,

    /// Host list file; empty disables persistence.
    #[arg(long)]
    hosts_file: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<RedirectorConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => RedirectorConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.bind_address = format!("0.0.0.0:{port}");
        }
        if self.api_ip.is_some() || self.api_port.is_some() {
            let (default_ip, default_port) = config
                .api
                .bind_address
                .rsplit_once(':')
                .map(|(ip, port)| (ip.to_string(), port.to_string()))
                .unwrap_or_else(|| ("127.0.0.1".to_string(), "9001".to_string()));
            let ip = self.api_ip.unwrap_or(default_ip);
            let port = self.api_port.map(|p| p.to_string()).unwrap_or(default_port);
            config.api.bind_address = format!("{ip}:{port}");
        }
        if let Some(period) = self.stats_period {
            config.poller.interval_secs = period;
        }
        if let Some(path) = self.hosts_file {
            config.hosts_file.path = path;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config()?;
    logging::init_logging(&config.observability);

    tracing::info!("tmpnb-redirector v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        listen = %config.listener.bind_address,
        api = %config.api.bind_address,
        stats_period_secs = config.poller.interval_secs,
        hosts_file = %config.hosts_file.path,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
