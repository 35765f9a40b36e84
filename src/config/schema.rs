//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the redirector.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the redirector.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RedirectorConfig {
    /// Public listener (redirects, spawn, stats report).
    pub listener: ListenerConfig,

    /// Hosts API listener.
    pub api: ApiConfig,

    /// Target stats polling.
    pub poller: PollerConfig,

    /// Spawn forwarding.
    pub spawn: SpawnConfig,

    /// Persisted host list.
    pub hosts_file: HostsFileConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Public listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9000".to_string(),
        }
    }
}

/// Hosts API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address. Loopback by default: the API is unauthenticated.
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:9001".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Stats polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Seconds between full poll passes.
    pub interval_secs: u64,

    /// Per-target request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Path appended to each host to fetch its stats.
    pub stats_path: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            timeout_ms: 20_000,
            stats_path: "/stats".to_string(),
        }
    }
}

/// Spawn forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Upstream request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Path appended to the selected host.
    pub path: String,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 20_000,
            path: "/api/spawn/".to_string(),
        }
    }
}

/// Host list file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostsFileConfig {
    /// File path. Empty disables persistence.
    pub path: String,
}

impl Default for HostsFileConfig {
    fn default() -> Self {
        Self {
            path: "hosts.txt".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
