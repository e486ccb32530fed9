//! Cloud provider trait

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::InstanceSnapshot;

/// Capability surface of a cloud provider
///
/// Both operations must be idempotent: the outer scheduler may re-run a job
/// after a failure, so repeating a call has no effect beyond the first
/// successful one.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Read the current external state of the instance backing `host_id`
    ///
    /// # Errors
    /// `ProviderError::Unavailable` on transient failures,
    /// `ProviderError::InstanceNotFound` if the instance is gone.
    async fn get_instance_status(&self, host_id: &str) -> Result<InstanceSnapshot, ProviderError>;

    /// Terminate the instance backing `host_id`
    ///
    /// # Errors
    /// Same failure modes as `get_instance_status`, plus
    /// `ProviderError::Unsupported` for providers that cannot terminate.
    async fn terminate(&self, host_id: &str) -> Result<(), ProviderError>;

    /// Provider tag as stored on host records
    fn provider_name(&self) -> &'static str;
}
