//! Target stats polling subsystem.
//!
//! # Data Flow
//! ```text
//! Interval timer ─┐
//! Registry add ───┼→ poller.rs (poll_all)
//! Startup pass ───┘      → GET <host>/stats for every host, in parallel
//!                        → report.rs (parse {available, capacity})
//!                        → registry.apply_poll (replace record, or Down on any failure)
//! ```
//!
//! # Design Decisions
//! - Every probe has its own timeout; one hanging target cannot hold up the rest
//! - No retries within a pass; a failed target waits for the next one
//! - Poll errors never reach request handling

pub mod poller;
pub mod report;

pub use poller::{PollOutcome, PollSummary, StatsPoller};
pub use report::{PollError, StatsReport};
