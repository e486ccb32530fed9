//! Provider for statically provisioned machines
//!
//! Static hosts have no cloud API behind them. Reachability is probed with a
//! TCP connect to the SSH port; the machine itself is never reported as
//! terminated and cannot be terminated from here.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::error::ProviderError;
use crate::traits::CloudProvider;
use crate::types::{InstanceSnapshot, InstanceStatus};

/// Provider tag used by host records owned by the static provider
pub const STATIC_PROVIDER_NAME: &str = "static";

/// Static machine provider
#[derive(Debug, Clone)]
pub struct StaticProvider {
    /// Host id to DNS name or IP address
    targets: HashMap<String, String>,
    ssh_port: u16,
    probe_timeout: Duration,
}

impl StaticProvider {
    /// Create a provider probing `ssh_port` with the given timeout
    #[must_use]
    pub fn new(ssh_port: u16, probe_timeout: Duration) -> Self {
        Self {
            targets: HashMap::new(),
            ssh_port,
            probe_timeout,
        }
    }

    /// Add a machine address for `host_id`
    #[must_use]
    pub fn with_target(mut self, host_id: impl Into<String>, addr: impl Into<String>) -> Self {
        self.targets.insert(host_id.into(), addr.into());
        self
    }

    /// Number of known machines
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Try to open a TCP connection to the SSH port
    #[instrument(skip(self), level = "debug")]
    async fn probe(&self, addr: &str) -> bool {
        let start = Instant::now();

        match timeout(
            self.probe_timeout,
            TcpStream::connect((addr, self.ssh_port)),
        )
        .await
        {
            Ok(Ok(_stream)) => {
                debug!(addr = %addr, elapsed = ?start.elapsed(), "ssh port reachable");
                true
            }
            Ok(Err(e)) => {
                warn!(addr = %addr, error = %e, "ssh probe failed");
                false
            }
            Err(_) => {
                warn!(
                    addr = %addr,
                    timeout = ?self.probe_timeout,
                    "ssh probe timed out"
                );
                false
            }
        }
    }
}

impl Default for StaticProvider {
    fn default() -> Self {
        Self::new(22, Duration::from_secs(5))
    }
}

#[async_trait]
impl CloudProvider for StaticProvider {
    async fn get_instance_status(&self, host_id: &str) -> Result<InstanceSnapshot, ProviderError> {
        let addr = self
            .targets
            .get(host_id)
            .ok_or_else(|| ProviderError::InstanceNotFound(host_id.to_string()))?;

        let reachable = self.probe(addr).await;

        Ok(InstanceSnapshot {
            is_up: reachable,
            is_ssh_reachable: reachable,
            status: InstanceStatus::Running,
        })
    }

    async fn terminate(&self, _host_id: &str) -> Result<(), ProviderError> {
        Err(ProviderError::Unsupported {
            provider: STATIC_PROVIDER_NAME.to_string(),
            operation: "terminate".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        STATIC_PROVIDER_NAME
    }
}
