//! Host record store
//!
//! The store is the only shared mutable resource. Writers never do a blind
//! read-modify-write: `update_if_status` only applies when the record still
//! has the status the caller observed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::host::{Host, HostUpdate};
use crate::state::HostStatus;

/// Errors raised by a store backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend I/O failure
    #[error("backend failure: {0}")]
    Backend(String),

    /// Insert of an id that is already present
    #[error("host already exists: {0}")]
    AlreadyExists(String),
}

/// Result of a conditional update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update was written
    Applied,
    /// The record had moved on to `actual`; nothing was written
    Conflict {
        /// Status found in the store
        actual: HostStatus,
    },
    /// No record with that id
    NotFound,
}

/// Persistent host storage with optimistic updates
#[async_trait]
pub trait HostStore: Send + Sync {
    /// Load one host by id
    ///
    /// # Errors
    /// Returns `StoreError::Backend` if the backend cannot be read.
    async fn find_one(&self, id: &str) -> Result<Option<Host>, StoreError>;

    /// Write `update` only if the host's status is still `expected`
    ///
    /// # Errors
    /// Returns `StoreError::Backend` if the backend cannot be written.
    async fn update_if_status(
        &self,
        id: &str,
        expected: HostStatus,
        update: HostUpdate,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Add a new host record
    ///
    /// # Errors
    /// Returns `StoreError::AlreadyExists` for a duplicate id.
    async fn insert(&self, host: Host) -> Result<(), StoreError>;

    /// All hosts that are not terminated, ordered by id
    ///
    /// # Errors
    /// Returns `StoreError::Backend` if the backend cannot be read.
    async fn find_active(&self) -> Result<Vec<Host>, StoreError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryHostStore {
    hosts: RwLock<BTreeMap<String, Host>>,
    writes: AtomicUsize,
}

impl MemoryHostStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of updates applied since creation
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Remove a host record, returning it if present
    pub async fn remove(&self, id: &str) -> Option<Host> {
        self.hosts.write().await.remove(id)
    }

    /// Number of records
    pub async fn len(&self) -> usize {
        self.hosts.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.hosts.read().await.is_empty()
    }
}

#[async_trait]
impl HostStore for MemoryHostStore {
    async fn find_one(&self, id: &str) -> Result<Option<Host>, StoreError> {
        Ok(self.hosts.read().await.get(id).cloned())
    }

    async fn update_if_status(
        &self,
        id: &str,
        expected: HostStatus,
        update: HostUpdate,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut hosts = self.hosts.write().await;

        let Some(host) = hosts.get_mut(id) else {
            return Ok(UpdateOutcome::NotFound);
        };

        if host.status != expected {
            debug!(
                host = %id,
                expected = %expected,
                actual = %host.status,
                "conditional update rejected"
            );
            return Ok(UpdateOutcome::Conflict {
                actual: host.status,
            });
        }

        update.apply(host);
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(UpdateOutcome::Applied)
    }

    async fn insert(&self, host: Host) -> Result<(), StoreError> {
        let mut hosts = self.hosts.write().await;
        if hosts.contains_key(&host.id) {
            return Err(StoreError::AlreadyExists(host.id));
        }
        hosts.insert(host.id.clone(), host);
        Ok(())
    }

    async fn find_active(&self) -> Result<Vec<Host>, StoreError> {
        Ok(self
            .hosts
            .read()
            .await
            .values()
            .filter(|h| !h.status.is_terminal())
            .cloned()
            .collect())
    }
}
