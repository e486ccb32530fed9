//! In-memory provider for tests and local runs
//!
//! Every `MockProvider` owns its own instance table; callers hand the same
//! `Arc<MockProvider>` to the registry and to the test that drives it.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::ProviderError;
use crate::traits::CloudProvider;
use crate::types::{InstanceSnapshot, InstanceStatus};

/// Provider tag used by host records owned by the mock provider
pub const MOCK_PROVIDER_NAME: &str = "mock";

/// Fake instance state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockInstance {
    pub is_up: bool,
    pub is_ssh_reachable: bool,
    pub status: InstanceStatus,
}

impl Default for MockInstance {
    fn default() -> Self {
        Self {
            is_up: true,
            is_ssh_reachable: true,
            status: InstanceStatus::Running,
        }
    }
}

impl From<MockInstance> for InstanceSnapshot {
    fn from(m: MockInstance) -> Self {
        Self {
            is_up: m.is_up,
            is_ssh_reachable: m.is_ssh_reachable,
            status: m.status,
        }
    }
}

/// Deterministic in-memory cloud provider
#[derive(Debug, Default)]
pub struct MockProvider {
    instances: Mutex<HashMap<String, MockInstance>>,
    failure: Mutex<Option<ProviderError>>,
    latency: Option<Duration>,
    status_queries: AtomicUsize,
    terminations: AtomicUsize,
}

impl MockProvider {
    /// Create an empty mock provider
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` before answering
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Register or replace the instance backing `host_id`
    pub fn set(&self, host_id: impl Into<String>, instance: MockInstance) {
        self.lock_instances().insert(host_id.into(), instance);
    }

    /// Current fake state of `host_id`
    #[must_use]
    pub fn get(&self, host_id: &str) -> Option<MockInstance> {
        self.lock_instances().get(host_id).copied()
    }

    /// Drop the instance backing `host_id`
    pub fn remove(&self, host_id: &str) -> Option<MockInstance> {
        self.lock_instances().remove(host_id)
    }

    /// Make every subsequent call fail with `error` (`None` clears it)
    pub fn fail_with(&self, error: Option<ProviderError>) {
        *self
            .failure
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = error;
    }

    /// Clear instances, injected failures and counters
    pub fn reset(&self) {
        self.lock_instances().clear();
        self.fail_with(None);
        self.status_queries.store(0, Ordering::SeqCst);
        self.terminations.store(0, Ordering::SeqCst);
    }

    /// Number of `get_instance_status` calls answered
    #[must_use]
    pub fn status_queries(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }

    /// Number of terminations that changed an instance
    #[must_use]
    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }

    fn lock_instances(&self) -> std::sync::MutexGuard<'_, HashMap<String, MockInstance>> {
        self.instances
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn injected_failure(&self) -> Option<ProviderError> {
        self.failure
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl CloudProvider for MockProvider {
    #[instrument(skip(self), level = "debug")]
    async fn get_instance_status(&self, host_id: &str) -> Result<InstanceSnapshot, ProviderError> {
        self.simulate_latency().await;
        self.status_queries.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.injected_failure() {
            return Err(err);
        }

        let instance = self
            .get(host_id)
            .ok_or_else(|| ProviderError::InstanceNotFound(host_id.to_string()))?;

        debug!(host = %host_id, status = %instance.status, "mock instance status");

        Ok(instance.into())
    }

    #[instrument(skip(self), level = "debug")]
    async fn terminate(&self, host_id: &str) -> Result<(), ProviderError> {
        self.simulate_latency().await;

        if let Some(err) = self.injected_failure() {
            return Err(err);
        }

        let mut instances = self.lock_instances();
        let instance = instances
            .get_mut(host_id)
            .ok_or_else(|| ProviderError::InstanceNotFound(host_id.to_string()))?;

        if instance.status != InstanceStatus::Terminated {
            instance.status = InstanceStatus::Terminated;
            instance.is_up = false;
            instance.is_ssh_reachable = false;
            self.terminations.fetch_add(1, Ordering::SeqCst);
            debug!(host = %host_id, "mock instance terminated");
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        MOCK_PROVIDER_NAME
    }
}
