//! Per-host target state.
//!
//! # States
//! - Down: the last poll failed, or the host has not been polled successfully yet
//! - Reporting: the host answered its status endpoint with spare and total capacity
//!
//! Internally the state is a tagged variant so a down host can never carry
//! capacity. On the wire it is flattened to `{available, capacity, down}`.

use serde::{Deserialize, Serialize};

/// Current state of a single target.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TargetStatus {
    /// Not routable.
    #[default]
    Down,
    /// Up, with self-reported spare and total slots.
    Reporting { available: f64, capacity: f64 },
}

impl TargetStatus {
    pub fn is_down(&self) -> bool {
        matches!(self, TargetStatus::Down)
    }

    /// Spare slots; zero for a down host.
    pub fn available(&self) -> f64 {
        match self {
            TargetStatus::Down => 0.0,
            TargetStatus::Reporting { available, .. } => *available,
        }
    }

    /// Total slots; zero for a down host.
    pub fn capacity(&self) -> f64 {
        match self {
            TargetStatus::Down => 0.0,
            TargetStatus::Reporting { capacity, .. } => *capacity,
        }
    }
}

/// Flat serialized form of a [`TargetStatus`], as shown in the stats report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub available: f64,
    pub capacity: f64,
    pub down: bool,
}

impl From<TargetStatus> for TargetRecord {
    fn from(status: TargetStatus) -> Self {
        Self {
            available: status.available(),
            capacity: status.capacity(),
            down: status.is_down(),
        }
    }
}

impl From<TargetRecord> for TargetStatus {
    fn from(record: TargetRecord) -> Self {
        if record.down {
            TargetStatus::Down
        } else {
            TargetStatus::Reporting {
                available: record.available,
                capacity: record.capacity,
            }
        }
    }
}

impl Serialize for TargetStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TargetRecord::from(*self).serialize(serializer)
    }
}
