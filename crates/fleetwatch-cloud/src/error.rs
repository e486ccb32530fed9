//! Error types for fleetwatch-cloud

use thiserror::Error;

/// Errors that can occur while talking to a cloud provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider API could not be reached or answered with a transient failure
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The instance no longer exists at the provider
    #[error("instance not found: {0}")]
    InstanceNotFound(String),

    /// The provider cannot perform this operation for this host
    #[error("operation not supported by provider {provider}: {operation}")]
    Unsupported {
        /// Provider tag
        provider: String,
        /// Operation that was attempted
        operation: String,
    },
}

impl ProviderError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Unavailable(_))
    }

    /// Check if the instance is gone at the provider
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::InstanceNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(ProviderError::Unavailable("timeout".to_string()).is_retryable());
        assert!(!ProviderError::InstanceNotFound("h1".to_string()).is_retryable());
        assert!(
            !ProviderError::Unsupported {
                provider: "static".to_string(),
                operation: "terminate".to_string(),
            }
            .is_retryable()
        );
    }
}
