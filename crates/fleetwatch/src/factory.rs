//! Builds the host store and provider registry from configuration

use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use fleetwatch_cloud::{
    MOCK_PROVIDER_NAME, MockInstance, MockProvider, ProviderRegistry, STATIC_PROVIDER_NAME,
    StaticProvider,
};
use fleetwatch_core::{Host, HostStore, MemoryHostStore};

use crate::config::{Config, HostEntry};

/// Create the provider registry for the configured hosts
///
/// Providers know each host by its `instance_id`, falling back to the host
/// id. Static hosts need an address; mock hosts start as healthy running
/// instances. Hosts with other provider tags are kept but will fail their
/// checks until a provider for the tag exists.
///
/// # Errors
/// Returns error if a static host has no address
pub fn build_registry(config: &Config) -> Result<ProviderRegistry> {
    let timeout = Duration::from_millis(config.static_provider.probe_timeout_ms);
    let mut static_provider = StaticProvider::new(config.static_provider.ssh_port, timeout);
    let mock_provider = MockProvider::new();

    for entry in &config.host {
        let instance = entry.instance_id.as_deref().unwrap_or(&entry.id);
        match entry.provider.as_str() {
            STATIC_PROVIDER_NAME => {
                let Some(addr) = &entry.addr else {
                    eyre::bail!("static host {} has no addr", entry.id);
                };
                static_provider = static_provider.with_target(instance, addr.clone());
            }
            MOCK_PROVIDER_NAME => mock_provider.set(instance, MockInstance::default()),
            other => {
                tracing::warn!(host = %entry.id, provider = %other, "no provider for host");
            }
        }
    }

    tracing::info!(
        static_hosts = static_provider.target_count(),
        "provider registry ready"
    );

    Ok(ProviderRegistry::new()
        .with_provider(Arc::new(static_provider))
        .with_provider(Arc::new(mock_provider)))
}

/// Create an in-memory store seeded with the configured hosts
///
/// # Errors
/// Returns error on duplicate host ids
pub async fn build_store(config: &Config) -> Result<Arc<MemoryHostStore>> {
    let store = Arc::new(MemoryHostStore::new());
    for entry in &config.host {
        store
            .insert(host_from_entry(entry))
            .await
            .map_err(|e| eyre::eyre!("failed to seed host store: {e}"))?;
    }
    Ok(store)
}

fn host_from_entry(entry: &HostEntry) -> Host {
    let host = Host::new(
        entry.id.clone(),
        entry.provider.clone(),
        entry.started_by.clone(),
        entry.status,
    );
    match &entry.instance_id {
        Some(instance_id) => host.with_instance_id(instance_id.clone()),
        None => host,
    }
}
