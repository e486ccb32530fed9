//! fleetwatch-cloud: Cloud provider abstraction
//!
//! Provides the provider capability trait, instance snapshot types and the
//! mock and static-machine implementations.

pub mod error;
pub mod mock;
pub mod registry;
pub mod static_host;
pub mod traits;
pub mod types;

pub use error::ProviderError;
pub use mock::{MOCK_PROVIDER_NAME, MockInstance, MockProvider};
pub use registry::ProviderRegistry;
pub use static_host::{STATIC_PROVIDER_NAME, StaticProvider};
pub use traits::CloudProvider;
pub use types::{InstanceSnapshot, InstanceStatus};
