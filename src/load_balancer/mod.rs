//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → registry snapshot (immutable, no network I/O)
//!     → LoadBalancer::select
//!         - weighted.rs (random draw weighted by spare capacity)
//!     → Host or SelectError
//! ```
//!
//! # Design Decisions
//! - Selection is per-request and memoryless
//! - Down targets are never candidates
//! - "Nothing registered" and "everything down" are distinct failures

pub mod weighted;

use thiserror::Error;

use crate::registry::{Host, Snapshot};

pub use weighted::WeightedSelector;

/// Why no target could be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectError {
    /// The registry is empty.
    #[error("No redirect targets are configured")]
    NoTargetsConfigured,

    /// Targets are registered but none is up.
    #[error("All redirect targets are down")]
    AllTargetsDown,
}

impl SelectError {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SelectError::NoTargetsConfigured => "no_targets",
            SelectError::AllTargetsDown => "all_down",
        }
    }
}

/// Strategy that picks one live target from a registry snapshot.
pub trait LoadBalancer: Send + Sync {
    fn select(&self, snapshot: &Snapshot) -> Result<Host, SelectError>;
}
