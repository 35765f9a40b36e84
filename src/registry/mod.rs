//! Host registry subsystem.
//!
//! # Data Flow
//! ```text
//! Hosts API (add/remove)
//!     → host.rs (validate http/https URL)
//!     → HostRegistry (copy-on-write map swap)
//!     → store.rs (rewrite sorted host file)
//!     → poll request signalled to the stats poller
//!
//! Stats poller
//!     → apply_poll (write back only if the host is still registered)
//!
//! Request path
//!     → snapshot() (immutable Arc of the whole map, no locking)
//! ```
//!
//! # Design Decisions
//! - Readers never block: the map lives behind an `ArcSwap`
//! - Writers serialize on one mutex, held only for a map copy and swap
//!   (plus the host file rewrite on add/remove), never across network I/O
//! - A freshly added host is Down until its first successful poll

pub mod host;
pub mod store;
pub mod target;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::Notify;

pub use host::Host;
pub use store::HostStore;
pub use target::{TargetRecord, TargetStatus};

use crate::observability::metrics;

/// Point-in-time copy of the registry.
pub type Snapshot = Arc<BTreeMap<Host, TargetStatus>>;

/// Errors returned by registry mutations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Host is not an absolute http/https URL.
    #[error("Invalid host, must include http or https: {0}")]
    InvalidHost(String),

    /// Host is not registered.
    #[error("Host not found: {0}")]
    NotFound(String),

    /// The in-memory change was applied but the host file could not be written.
    #[error("Failed to persist host list: {0}")]
    Persist(#[from] std::io::Error),
}

/// Shared mapping from host to its latest known state.
#[derive(Debug)]
pub struct HostRegistry {
    targets: ArcSwap<BTreeMap<Host, TargetStatus>>,
    write_lock: Mutex<()>,
    store: Option<HostStore>,
    poll_requests: Notify,
}

impl HostRegistry {
    /// Create an empty registry, optionally backed by a host file.
    pub fn new(store: Option<HostStore>) -> Self {
        Self::with_hosts(Vec::new(), store)
    }

    /// Create a registry seeded with the given hosts, all Down.
    pub fn with_hosts(hosts: Vec<Host>, store: Option<HostStore>) -> Self {
        let targets: BTreeMap<Host, TargetStatus> = hosts
            .into_iter()
            .map(|h| (h, TargetStatus::Down))
            .collect();

        Self {
            targets: ArcSwap::from_pointee(targets),
            write_lock: Mutex::new(()),
            store,
            poll_requests: Notify::new(),
        }
    }

    /// Create a registry from the hosts listed in `store`.
    pub fn load(store: HostStore) -> std::io::Result<Self> {
        let hosts = store.load()?;
        Ok(Self::with_hosts(hosts, Some(store)))
    }

    /// Register a host.
    ///
    /// Re-adding a known host keeps its current state. Every successful call
    /// requests a poll pass over the whole registry.
    pub fn add(&self, raw: &str) -> Result<Host, RegistryError> {
        let host = Host::parse(raw)?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.targets.load_full();
        let inserted = !current.contains_key(&host);
        if inserted {
            let mut next = (*current).clone();
            next.insert(host.clone(), TargetStatus::Down);
            self.targets.store(Arc::new(next));
            tracing::info!(host = %host, "Host registered");
        } else {
            tracing::debug!(host = %host, "Host already registered");
        }

        self.request_poll();
        self.persist()?;
        Ok(host)
    }

    /// Unregister a host. Its record is dropped immediately.
    pub fn remove(&self, raw: &str) -> Result<Host, RegistryError> {
        let host = Host::parse(raw)?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.targets.load_full();
        if !current.contains_key(&host) {
            return Err(RegistryError::NotFound(host.to_string()));
        }

        let mut next = (*current).clone();
        next.remove(&host);
        self.targets.store(Arc::new(next));
        tracing::info!(host = %host, "Host removed");

        self.persist()?;
        Ok(host)
    }

    /// Immutable copy of the current mapping.
    pub fn snapshot(&self) -> Snapshot {
        self.targets.load_full()
    }

    /// Replace the state of `host` with a poll result.
    ///
    /// Returns `false` and discards the result if the host was removed
    /// while the poll was in flight.
    pub fn apply_poll(&self, host: &Host, status: TargetStatus) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.targets.load_full();
        match current.get(host) {
            None => {
                tracing::debug!(host = %host, "Discarding poll result for removed host");
                false
            }
            Some(existing) if *existing == status => true,
            Some(_) => {
                let mut next = (*current).clone();
                next.insert(host.clone(), status);
                self.targets.store(Arc::new(next));
                true
            }
        }
    }

    /// Ask the poller for a pass over the whole registry.
    ///
    /// Requests made while a pass is pending collapse into one.
    pub fn request_poll(&self) {
        self.poll_requests.notify_one();
    }

    /// Resolves once a poll has been requested.
    pub async fn poll_requested(&self) {
        self.poll_requests.notified().await;
    }

    pub fn len(&self) -> usize {
        self.targets.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.load().is_empty()
    }

    fn persist(&self) -> Result<(), RegistryError> {
        let snapshot = self.targets.load_full();
        metrics::record_hosts(&snapshot);

        let Some(store) = &self.store else {
            return Ok(());
        };
        if let Err(e) = store.save(snapshot.keys()) {
            tracing::error!(path = %store.path().display(), error = %e, "Failed to save hosts file");
            return Err(RegistryError::Persist(e));
        }
        Ok(())
    }
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn reporting(available: f64, capacity: f64) -> TargetStatus {
        TargetStatus::Reporting { available, capacity }
    }

    #[test]
    fn test_add_starts_down() {
        let registry = HostRegistry::default();
        let host = registry.add("https://x").unwrap();
        assert_eq!(registry.snapshot().get(&host), Some(&TargetStatus::Down));
    }

    #[test]
    fn test_add_rejects_invalid_scheme() {
        let registry = HostRegistry::default();
        assert!(matches!(registry.add("ftp://x"), Err(RegistryError::InvalidHost(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_add_is_idempotent() {
        let registry = HostRegistry::default();
        let host = registry.add("http://a").unwrap();
        assert!(registry.apply_poll(&host, reporting(2.0, 5.0)));

        registry.add("http://a").unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot().get(&host), Some(&reporting(2.0, 5.0)));
    }

    #[test]
    fn test_remove_missing_host() {
        let registry = HostRegistry::default();
        assert!(matches!(registry.remove("http://a"), Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_poll_result_for_removed_host_is_dropped() {
        let registry = HostRegistry::default();
        let host = registry.add("http://a").unwrap();
        registry.remove("http://a").unwrap();

        assert!(!registry.apply_poll(&host, reporting(1.0, 1.0)));
        assert!(registry.snapshot().get(&host).is_none());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let registry = HostRegistry::default();
        let host = registry.add("http://a").unwrap();
        let before = registry.snapshot();

        registry.apply_poll(&host, reporting(7.0, 8.0));
        assert_eq!(before.get(&host), Some(&TargetStatus::Down));
        assert_eq!(registry.snapshot().get(&host), Some(&reporting(7.0, 8.0)));
    }

    #[test]
    fn test_mutations_rewrite_hosts_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.txt");
        let registry = HostRegistry::new(Some(HostStore::new(&path)));

        registry.add("https://b").unwrap();
        registry.add("http://a").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "http://a\nhttps://b\n");

        registry.remove("https://b").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "http://a\n");

        let reloaded = HostRegistry::load(HostStore::new(&path)).unwrap();
        let snapshot = reloaded.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.values().all(TargetStatus::is_down));
    }

    #[test]
    fn test_unwritable_hosts_file_keeps_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("hosts.txt");
        let registry = HostRegistry::new(Some(HostStore::new(&path)));

        assert!(matches!(registry.add("http://a"), Err(RegistryError::Persist(_))));
        assert!(registry.snapshot().contains_key("http://a"));

        assert!(matches!(registry.remove("http://a"), Err(RegistryError::Persist(_))));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_add_requests_poll() {
        let registry = HostRegistry::default();
        registry.add("http://a").unwrap();
        tokio::time::timeout(Duration::from_millis(100), registry.poll_requested())
            .await
            .expect("add should request a poll");
    }
}
