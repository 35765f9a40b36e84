//! Metrics collection and exposition.
//!
//! # Metrics
//! - `redirector_selections_total` (counter): target selections by outcome
//! - `redirector_polls_total` (counter): per-target poll results
//! - `redirector_hosts` (gauge): registered targets by state (up/down)
//! - `redirector_spawn_total` (counter): spawn forwards by result
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::registry::Snapshot;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_selection(outcome: &'static str) {
    ::metrics::counter!("redirector_selections_total", "outcome" => outcome).increment(1);
}

pub fn record_poll(result: &'static str) {
    ::metrics::counter!("redirector_polls_total", "result" => result).increment(1);
}

pub fn record_spawn(result: &'static str) {
    ::metrics::counter!("redirector_spawn_total", "result" => result).increment(1);
}

pub fn record_hosts(snapshot: &Snapshot) {
    let down = snapshot.values().filter(|s| s.is_down()).count();
    let up = snapshot.len() - down;
    ::metrics::gauge!("redirector_hosts", "state" => "up").set(up as f64);
    ::metrics::gauge!("redirector_hosts", "state" => "down").set(down as f64);
}
