//! Plugin-based provider registry
//!
//! The registry maps provider type names to factories. The caller builds one
//! at startup, registers the providers it ships with, and constructs the
//! configured provider from it. There is no process-wide registry.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zonesync_core::registry::ProviderRegistry;
//! use zonesync_core::config::ProviderConfig;
//!
//! let registry = ProviderRegistry::with_builtin();
//! zonesync_provider_gcore::register(&registry);
//!
//! let config = ProviderConfig::Gcore { api_key: "...".into(), api_url: None };
//! let provider = registry.create_provider(&config)?;
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Provider registry for plugin-based DNS provider creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered DNS provider factories
    providers: RwLock<HashMap<String, Box<dyn DnsProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the providers built into this crate
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        crate::provider::memory::register(&registry);
        registry
    }

    /// Register a DNS provider factory
    ///
    /// Registering a name twice replaces the earlier factory.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use zonesync_core::registry::ProviderRegistry;
    /// # use zonesync_core::traits::DnsProviderFactory;
    /// # struct MyFactory;
    /// # impl DnsProviderFactory for MyFactory {
    /// #     fn create(&self, config: &zonesync_core::config::ProviderConfig) -> zonesync_core::Result<Box<dyn zonesync_core::DnsProvider>> { unimplemented!() }
    /// # }
    /// let registry = ProviderRegistry::new();
    /// registry.register_provider("myprovider", Box::new(MyFactory));
    /// ```
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        let name = name.into();
        tracing::debug!("Registering provider type: {}", name);
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.insert(name, factory);
    }

    /// Create a DNS provider from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If provider type is not registered or creation fails
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        let provider_type = config.type_name();
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }
}
