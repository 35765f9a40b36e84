//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Public listener
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → redirect.rs  GET /<path>      → 302 to <selected host>/<path>
//!     → spawn.rs     POST /api/spawn  → forward to <selected host>/api/spawn/
//!     → stats.rs     GET /stats       → pool report
//!     → response.rs (selection failures → 503)
//! ```

pub mod redirect;
pub mod request;
pub mod response;
pub mod server;
pub mod spawn;
pub mod stats;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{build_public_router, AppState, HttpServer};
pub use stats::PoolReport;
