//! Per-target status payload and poll failure taxonomy.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{de, Deserialize, Deserializer};
use thiserror::Error;

use crate::registry::TargetStatus;

/// Body returned by a target's status endpoint.
///
/// Only `available` and `capacity` are required. Both may be integers or
/// floats but must be finite and non-negative. Extra fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StatsReport {
    #[serde(deserialize_with = "slot_count")]
    pub available: f64,
    #[serde(deserialize_with = "slot_count")]
    pub capacity: f64,
    /// Lets a target take itself out of rotation.
    #[serde(default)]
    pub down: bool,
}

impl StatsReport {
    pub fn parse(body: &[u8]) -> Result<Self, PollError> {
        Ok(serde_json::from_slice(body)?)
    }
}

fn slot_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(de::Error::custom(format!("expected a non-negative number, got {value}")))
    }
}

impl From<StatsReport> for TargetStatus {
    fn from(report: StatsReport) -> Self {
        if report.down {
            TargetStatus::Down
        } else {
            TargetStatus::Reporting {
                available: report.available,
                capacity: report.capacity,
            }
        }
    }
}

/// Why a single target poll failed. Never leaves the poller.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("malformed stats body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

impl PollError {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            PollError::Transport(_) => "transport",
            PollError::Status(_) => "status",
            PollError::Parse(_) => "parse",
            PollError::Timeout(_) => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_report() {
        let report = StatsReport::parse(br#"{"available": 3, "capacity": 10}"#).unwrap();
        assert_eq!(
            TargetStatus::from(report),
            TargetStatus::Reporting { available: 3.0, capacity: 10.0 }
        );
    }

    #[test]
    fn test_float_counts_accepted() {
        let report = StatsReport::parse(br#"{"available": 3.0, "capacity": 10.0}"#).unwrap();
        assert_eq!(report.available, 3.0);
        assert_eq!(report.capacity, 10.0);

        let report = StatsReport::parse(br#"{"available": 2.5, "capacity": 4}"#).unwrap();
        assert_eq!(
            TargetStatus::from(report),
            TargetStatus::Reporting { available: 2.5, capacity: 4.0 }
        );
    }

    #[test]
    fn test_negative_counts_rejected() {
        let bodies: [&[u8]; 2] = [
            br#"{"available": -1.5, "capacity": 2}"#,
            br#"{"available": 1, "capacity": -2}"#,
        ];
        for body in bodies {
            let err = StatsReport::parse(body).unwrap_err();
            assert!(err.to_string().contains("non-negative"), "{err}");
        }
    }

    #[test]
    fn test_extra_fields_ignored() {
        let body = br#"{"available": 1, "capacity": 2, "version": "0.1", "pool": []}"#;
        assert!(StatsReport::parse(body).is_ok());
    }

    #[test]
    fn test_explicit_down() {
        let report = StatsReport::parse(br#"{"available": 5, "capacity": 5, "down": true}"#).unwrap();
        assert_eq!(TargetStatus::from(report), TargetStatus::Down);
    }

    #[test]
    fn test_malformed_bodies() {
        let bodies: [&[u8]; 5] = [
            b"not json",
            br#"{"available": 3}"#,
            br#"{"available": -1, "capacity": 2}"#,
            br#"{"available": "3", "capacity": 2}"#,
            br#"[1, 2]"#,
        ];
        for body in bodies {
            assert!(matches!(StatsReport::parse(body), Err(PollError::Parse(_))));
        }
    }
}
