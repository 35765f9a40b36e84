//! Target stats polling.
//!
//! # Responsibilities
//! - Query every registered target's status endpoint concurrently
//! - Replace each target's state with the parsed report, or mark it down
//! - Run on a fixed interval and whenever the registry asks for a pass

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::PollerConfig;
use crate::health::report::{PollError, StatsReport};
use crate::observability::metrics;
use crate::registry::{Host, HostRegistry, TargetStatus};

/// Result of refreshing a single target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Up,
    Down,
    /// The host was removed while its poll was in flight.
    Discarded,
}

/// Counts for one pass over the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub up: usize,
    pub down: usize,
    pub discarded: usize,
}

pub struct StatsPoller {
    registry: Arc<HostRegistry>,
    config: PollerConfig,
    client: reqwest::Client,
}

impl StatsPoller {
    pub fn new(registry: Arc<HostRegistry>, config: PollerConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tmpnb-redirector/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            registry,
            config,
            client,
        })
    }

    /// Poll until shutdown.
    ///
    /// A pre-populated registry is polled once right away; after that a pass
    /// runs every interval and whenever the registry requests one. Requests
    /// arriving during a pass collapse into a single follow-up pass.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let period = Duration::from_secs(self.config.interval_secs);
        tracing::info!(
            interval_secs = self.config.interval_secs,
            timeout_ms = self.config.timeout_ms,
            path = %self.config.stats_path,
            "Stats poller starting"
        );

        if !self.registry.is_empty() && !self.pass_or_shutdown(&mut shutdown).await {
            return;
        }

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.registry.poll_requested() => {}
                _ = shutdown.recv() => {
                    tracing::info!("Stats poller received shutdown signal, exiting loop");
                    break;
                }
            }

            if !self.pass_or_shutdown(&mut shutdown).await {
                break;
            }
        }
    }

    /// Run one pass unless shutdown fires first. Returns `false` on shutdown.
    async fn pass_or_shutdown(&self, shutdown: &mut broadcast::Receiver<()>) -> bool {
        tokio::select! {
            _ = self.poll_all() => true,
            _ = shutdown.recv() => {
                tracing::info!("Stats poller received shutdown signal, abandoning poll pass");
                false
            }
        }
    }

    /// Poll every registered host once, all in parallel.
    pub async fn poll_all(&self) -> PollSummary {
        let snapshot = self.registry.snapshot();
        let outcomes = join_all(snapshot.keys().map(|host| self.refresh(host))).await;

        let mut summary = PollSummary::default();
        for outcome in outcomes {
            match outcome {
                PollOutcome::Up => summary.up += 1,
                PollOutcome::Down => summary.down += 1,
                PollOutcome::Discarded => summary.discarded += 1,
            }
        }

        metrics::record_hosts(&self.registry.snapshot());
        tracing::debug!(
            up = summary.up,
            down = summary.down,
            discarded = summary.discarded,
            "Poll cycle complete"
        );
        summary
    }

    /// Fetch and parse one host's stats, bounded by the poll timeout.
    pub async fn poll_host(&self, host: &Host) -> Result<StatsReport, PollError> {
        let url = host.join_path(&self.config.stats_path);
        let timeout = Duration::from_millis(self.config.timeout_ms);

        let fetch = async {
            let response = self.client.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(PollError::Status(status));
            }
            let body = response.bytes().await?;
            StatsReport::parse(&body)
        };

        match time::timeout(timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(PollError::Timeout(timeout)),
        }
    }

    async fn refresh(&self, host: &Host) -> PollOutcome {
        let status = match self.poll_host(host).await {
            Ok(report) => {
                tracing::debug!(
                    host = %host,
                    available = report.available,
                    capacity = report.capacity,
                    down = report.down,
                    "Got stats"
                );
                metrics::record_poll("ok");
                TargetStatus::from(report)
            }
            Err(e) => {
                tracing::warn!(host = %host, error = %e, "Failed to get stats");
                metrics::record_poll(e.label());
                TargetStatus::Down
            }
        };

        if !self.registry.apply_poll(host, status) {
            PollOutcome::Discarded
        } else if status.is_down() {
            PollOutcome::Down
        } else {
            PollOutcome::Up
        }
    }
}
