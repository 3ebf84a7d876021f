// # DNS Provider Trait
//
// Defines the capability interface every provider backend implements.
//
// ## Implementations
//
// - G-Core: `zonesync-provider-gcore` crate
// - In-memory: [`crate::provider::MemoryProvider`] (tests, embedding, previews)
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> zonesync_core::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     if !provider.zone_exists("example.com.").await? {
//         provider.create_zone("example.com.").await?;
//     }
//     for rrset in provider.list_zone_record_names("example.com.").await? {
//         println!("{} {}", rrset.name, rrset.record_type);
//     }
//
//     Ok(())
// }
// ```

use crate::model::{Capabilities, NativeRRSet, RecordType};
use async_trait::async_trait;

/// One record set reported by a zone listing
///
/// The type is kept as the provider reported it; it is parsed (and
/// rejected if unknown) when the observed state is normalized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RRSetRef {
    /// Owner name as reported by the provider
    pub name: String,
    /// Record type as reported by the provider
    pub record_type: String,
}

impl RRSetRef {
    /// Create a new record set reference
    pub fn new(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
        }
    }
}

/// Trait for DNS provider implementations
///
/// Zone and owner names are passed in canonical form (lower case, trailing
/// dot); implementations adapt them to their API.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks: the
/// reconciler may run corrections of the same pass concurrently.
///
/// # Responsibilities
///
/// Providers execute exactly one remote operation per call and report
/// success or failure. They must not:
/// - retry or back off (owned by the `Reconciler`)
/// - decide whether a change is needed (owned by the diff engine)
/// - cache zone state between calls
///
/// Errors are returned as-is; the reconciler wraps them with the message of
/// the correction that triggered them.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Whether the provider hosts `zone`
    async fn zone_exists(&self, zone: &str) -> Result<bool, crate::Error>;

    /// Create an empty zone
    async fn create_zone(&self, zone: &str) -> Result<(), crate::Error>;

    /// List the record sets of a zone
    ///
    /// A listing is only an index: record sets such as CAA or SRV need the
    /// full detail returned by [`DnsProvider::get_rrset`].
    async fn list_zone_record_names(&self, zone: &str) -> Result<Vec<RRSetRef>, crate::Error>;

    /// Fetch one record set in native form
    async fn get_rrset(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<NativeRRSet, crate::Error>;

    /// Create a record set that does not exist yet
    async fn create_rrset(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
        rrset: &NativeRRSet,
    ) -> Result<(), crate::Error>;

    /// Overwrite an existing record set in place
    async fn update_rrset(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
        rrset: &NativeRRSet,
    ) -> Result<(), crate::Error>;

    /// Delete a record set
    async fn delete_rrset(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<(), crate::Error>;

    /// Nameservers the domain should be delegated to, in order
    async fn get_nameservers(&self, domain: &str) -> Result<Vec<String>, crate::Error>;

    /// What this provider can host
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
