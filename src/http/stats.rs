//! Pool stats report.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::http::server::AppState;
use crate::registry::{Host, Snapshot, TargetStatus};

/// Aggregate and per-host capacity, for external monitoring.
#[derive(Debug, Serialize)]
pub struct PoolReport<'a> {
    pub available: f64,
    pub capacity: f64,
    pub hosts: &'a BTreeMap<Host, TargetStatus>,
    pub version: &'static str,
}

impl<'a> PoolReport<'a> {
    pub fn from_snapshot(snapshot: &'a Snapshot) -> Self {
        let (available, capacity) = snapshot
            .values()
            .fold((0.0, 0.0), |(a, c), s| (a + s.available(), c + s.capacity()));

        Self {
            available,
            capacity,
            hosts: snapshot,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

pub async fn stats_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.registry.snapshot();
    Json(PoolReport::from_snapshot(&snapshot)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_report_sums_only_reporting_hosts() {
        let snapshot: Snapshot = Arc::new(
            [
                ("http://a", TargetStatus::Reporting { available: 3.0, capacity: 10.0 }),
                ("http://b", TargetStatus::Reporting { available: 1.5, capacity: 5.0 }),
                ("http://c", TargetStatus::Down),
            ]
            .into_iter()
            .map(|(h, s)| (Host::parse(h).unwrap(), s))
            .collect(),
        );

        let json = serde_json::to_value(PoolReport::from_snapshot(&snapshot)).unwrap();
        assert_eq!(json["available"], 4.5);
        assert_eq!(json["capacity"], 15.0);
        assert_eq!(json["hosts"]["http://c"]["down"], true);
        assert_eq!(json["hosts"]["http://a"]["available"], 3.0);
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
