// # Memory Provider
//
// In-memory implementation of DnsProvider.
//
// ## Purpose
//
// Hosts zones in a map protected by a RwLock. Useful for tests, for
// previewing a configuration without credentials, and for embedding.
//
// ## Provider rules it enforces
//
// Like real backends it refuses writes that would break DNS coexistence
// rules, so corrections applied in the wrong order fail here too:
// - a CNAME cannot share its name with any other record set
// - creating an existing record set, or updating/deleting a missing one,
//   is an error
//
// Nothing persists across restarts.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::model::{NativeRRSet, RecordType, fqdn};
use crate::traits::{DnsProvider, DnsProviderFactory, RRSetRef};

/// Record sets of one zone, keyed by (canonical name, type)
pub type ZoneContents = BTreeMap<(String, RecordType), NativeRRSet>;

/// In-memory provider implementation
///
/// Clones share the same zones.
///
/// # Example
///
/// ```rust,no_run
/// use zonesync_core::provider::MemoryProvider;
/// use zonesync_core::traits::DnsProvider;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = MemoryProvider::new();
///     provider.create_zone("example.com.").await?;
///     assert!(provider.zone_exists("example.com.").await?);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    zones: Arc<RwLock<BTreeMap<String, ZoneContents>>>,
    nameservers: Vec<String>,
}

impl MemoryProvider {
    /// Create a provider hosting no zones
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `nameservers` for every domain
    pub fn with_nameservers(mut self, nameservers: Vec<String>) -> Self {
        self.nameservers = nameservers;
        self
    }

    /// Store a record set directly, creating the zone if needed
    ///
    /// Bypasses the coexistence checks; meant for seeding observed state.
    pub async fn seed(&self, zone: &str, name: &str, record_type: RecordType, rrset: NativeRRSet) {
        let mut guard = self.zones.write().await;
        guard
            .entry(fqdn(zone))
            .or_default()
            .insert((fqdn(name), record_type), rrset);
    }

    /// Snapshot of one zone's record sets
    pub async fn zone_contents(&self, zone: &str) -> Option<ZoneContents> {
        self.zones.read().await.get(&fqdn(zone)).cloned()
    }

    /// Number of zones hosted
    pub async fn len(&self) -> usize {
        self.zones.read().await.len()
    }

    /// Whether no zone is hosted
    pub async fn is_empty(&self) -> bool {
        self.zones.read().await.is_empty()
    }
}

fn missing_zone(zone: &str) -> Error {
    Error::not_found(format!("zone {} does not exist", zone))
}

fn conflict(message: String) -> Error {
    Error::provider("memory", message)
}

/// CNAME coexistence check for a write of (name, record_type)
fn check_coexistence(contents: &ZoneContents, name: &str, record_type: RecordType) -> Result<()> {
    let others = contents
        .keys()
        .filter(|(n, t)| n == name && *t != record_type)
        .map(|(_, t)| *t);

    for other in others {
        if record_type == RecordType::Cname || other == RecordType::Cname {
            return Err(conflict(format!(
                "{} {} conflicts with existing {} {}",
                name, record_type, name, other
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl DnsProvider for MemoryProvider {
    async fn zone_exists(&self, zone: &str) -> Result<bool> {
        Ok(self.zones.read().await.contains_key(&fqdn(zone)))
    }

    async fn create_zone(&self, zone: &str) -> Result<()> {
        let mut guard = self.zones.write().await;
        let zone = fqdn(zone);
        if guard.contains_key(&zone) {
            return Err(conflict(format!("zone {} already exists", zone)));
        }
        guard.insert(zone, ZoneContents::new());
        Ok(())
    }

    async fn list_zone_record_names(&self, zone: &str) -> Result<Vec<RRSetRef>> {
        let guard = self.zones.read().await;
        let contents = guard.get(&fqdn(zone)).ok_or_else(|| missing_zone(zone))?;
        Ok(contents
            .keys()
            .map(|(name, t)| RRSetRef::new(name.clone(), t.as_str()))
            .collect())
    }

    async fn get_rrset(&self, zone: &str, name: &str, record_type: RecordType) -> Result<NativeRRSet> {
        let guard = self.zones.read().await;
        let contents = guard.get(&fqdn(zone)).ok_or_else(|| missing_zone(zone))?;
        contents
            .get(&(fqdn(name), record_type))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("record set {} {}", name, record_type)))
    }

    async fn create_rrset(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
        rrset: &NativeRRSet,
    ) -> Result<()> {
        let mut guard = self.zones.write().await;
        let contents = guard.get_mut(&fqdn(zone)).ok_or_else(|| missing_zone(zone))?;
        let key = (fqdn(name), record_type);
        if contents.contains_key(&key) {
            return Err(conflict(format!(
                "record set {} {} already exists",
                name, record_type
            )));
        }
        check_coexistence(contents, &key.0, record_type)?;
        contents.insert(key, rrset.clone());
        Ok(())
    }

    async fn update_rrset(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
        rrset: &NativeRRSet,
    ) -> Result<()> {
        let mut guard = self.zones.write().await;
        let contents = guard.get_mut(&fqdn(zone)).ok_or_else(|| missing_zone(zone))?;
        let existing = contents
            .get_mut(&(fqdn(name), record_type))
            .ok_or_else(|| Error::not_found(format!("record set {} {}", name, record_type)))?;
        *existing = rrset.clone();
        Ok(())
    }

    async fn delete_rrset(&self, zone: &str, name: &str, record_type: RecordType) -> Result<()> {
        let mut guard = self.zones.write().await;
        let contents = guard.get_mut(&fqdn(zone)).ok_or_else(|| missing_zone(zone))?;
        contents
            .remove(&(fqdn(name), record_type))
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("record set {} {}", name, record_type)))
    }

    async fn get_nameservers(&self, _domain: &str) -> Result<Vec<String>> {
        Ok(self.nameservers.clone())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating memory providers
pub struct MemoryProviderFactory;

impl DnsProviderFactory for MemoryProviderFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Memory { nameservers } => Ok(Box::new(
                MemoryProvider::new().with_nameservers(nameservers.clone()),
            )),
            _ => Err(Error::config("Invalid config for memory provider")),
        }
    }
}

/// Register the memory provider with a registry
pub fn register(registry: &crate::ProviderRegistry) {
    registry.register_provider("memory", Box::new(MemoryProviderFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NativeResourceRecord;
    use serde_json::json;

    fn rrset(value: &str) -> NativeRRSet {
        NativeRRSet {
            ttl: 300,
            resource_records: vec![NativeResourceRecord {
                content: vec![json!(value)],
                enabled: true,
            }],
        }
    }

    #[tokio::test]
    async fn test_memory_provider_basic() {
        let provider = MemoryProvider::new();
        assert!(provider.is_empty().await);

        provider.create_zone("example.com").await.unwrap();
        assert!(provider.zone_exists("EXAMPLE.com.").await.unwrap());
        assert!(provider.create_zone("example.com.").await.is_err());

        provider
            .create_rrset("example.com.", "www.example.com.", RecordType::A, &rrset("1.2.3.4"))
            .await
            .unwrap();
        let names = provider.list_zone_record_names("example.com.").await.unwrap();
        assert_eq!(names, vec![RRSetRef::new("www.example.com.", "A")]);

        provider
            .update_rrset("example.com.", "www.example.com.", RecordType::A, &rrset("5.6.7.8"))
            .await
            .unwrap();
        let got = provider
            .get_rrset("example.com.", "www.example.com.", RecordType::A)
            .await
            .unwrap();
        assert_eq!(got, rrset("5.6.7.8"));

        provider
            .delete_rrset("example.com.", "www.example.com.", RecordType::A)
            .await
            .unwrap();
        assert!(
            provider
                .delete_rrset("example.com.", "www.example.com.", RecordType::A)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_memory_provider_rejects_cname_coexistence() {
        let provider = MemoryProvider::new();
        provider
            .seed("example.com", "www.example.com", RecordType::Cname, rrset("old.example.com"))
            .await;

        let err = provider
            .create_rrset("example.com.", "www.example.com.", RecordType::A, &rrset("1.2.3.4"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("conflicts"));
    }

    #[tokio::test]
    async fn test_memory_provider_missing_zone() {
        let provider = MemoryProvider::new();
        assert!(matches!(
            provider.list_zone_record_names("example.com.").await,
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_factory() {
        let provider = MemoryProviderFactory
            .create(&ProviderConfig::Memory {
                nameservers: vec!["ns1.example.net".to_string()],
            })
            .unwrap();
        assert_eq!(provider.provider_name(), "memory");

        let wrong = ProviderConfig::Gcore {
            api_key: "k".to_string(),
            api_url: None,
        };
        assert!(MemoryProviderFactory.create(&wrong).is_err());
    }
}
