//! Provider lookup by tag

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::traits::CloudProvider;

/// Immutable map from provider tag to provider implementation
///
/// Built once at startup (or per test) and passed to every job that needs it.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn CloudProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under its own tag
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn CloudProvider>) -> Self {
        self.providers
            .insert(provider.provider_name().to_string(), provider);
        self
    }

    /// Look up the provider owning hosts tagged `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn CloudProvider>> {
        self.providers.get(name).cloned()
    }

    /// Registered provider tags, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;
    use crate::static_host::StaticProvider;

    #[test]
    fn test_lookup_by_tag() {
        let registry = ProviderRegistry::new()
            .with_provider(Arc::new(MockProvider::new()))
            .with_provider(Arc::new(StaticProvider::default()));

        assert_eq!(registry.names(), vec!["mock", "static"]);
        assert_eq!(registry.get("mock").unwrap().provider_name(), "mock");
        assert!(registry.get("ec2").is_none());
    }
}
