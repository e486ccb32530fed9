//! Core error types for fleetwatch-core

use thiserror::Error;

use fleetwatch_cloud::ProviderError;

use crate::state::HostStatus;
use crate::store::StoreError;

/// Errors that can occur while reconciling hosts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Host not found in the store
    #[error("host not found: {0}")]
    HostNotFound(String),

    /// Provider call failed transiently, safe to retry
    #[error("provider unavailable: {0}")]
    TransientProvider(String),

    /// Provider refused the request
    #[error("provider rejected request: {0}")]
    ProviderRejected(String),

    /// No provider registered for the host's provider tag
    #[error("no provider registered for {0}")]
    UnknownProvider(String),

    /// Host store failure
    #[error("host store error: {0}")]
    Store(String),

    /// Invalid state transition attempted
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition {
        /// Current state
        from: HostStatus,
        /// Attempted target state
        to: HostStatus,
    },

    /// Run was cancelled before any irreversible action
    #[error("job cancelled")]
    Cancelled,

    /// Actor communication error
    #[error("actor communication error: {0}")]
    ActorError(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl CoreError {
    /// Check if the outer scheduler may simply run the job again
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::TransientProvider(_) | CoreError::Store(_) | CoreError::Cancelled
        )
    }
}

impl From<ProviderError> for CoreError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(msg) => CoreError::TransientProvider(msg),
            other => CoreError::ProviderRejected(other.to_string()),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::Store(err.to_string())
    }
}
