//! Capacity-weighted redirect service for a pool of notebook hosts.

pub mod admin;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod registry;

pub use config::RedirectorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::HostRegistry;
