//! Test doubles and common utilities for contract tests
//!
//! `RecordingProvider` hosts zones in a [`MemoryProvider`] and records every
//! call made through the `DnsProvider` interface, so tests can assert on
//! exactly which remote operations ran and in which order.

#![allow(dead_code)]

use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zonesync_core::error::{Error, Result};
use zonesync_core::model::{NativeRRSet, NativeResourceRecord, RecordType};
use zonesync_core::traits::{DnsProvider, RRSetRef};
use zonesync_core::{
    Capabilities, DomainConfig, EngineConfig, MemoryProvider, RecordConfig, RecordData,
};

/// A DnsProvider backed by MemoryProvider that tracks calls
pub struct RecordingProvider {
    /// Hosted zones
    inner: MemoryProvider,
    /// Mutating calls, in order, as "verb name TYPE"
    mutations: Arc<Mutex<Vec<String>>>,
    /// Call counter for read calls
    read_call_count: Arc<AtomicUsize>,
    /// Remaining injected failures, keyed like `mutations` entries
    failures: Arc<Mutex<HashMap<String, usize>>>,
    /// Fail every read call
    fail_reads: Arc<AtomicUsize>,
    /// Capabilities reported to the planner
    capabilities: Capabilities,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::wrapping(MemoryProvider::new())
    }

    /// Record calls made against an existing memory provider
    pub fn wrapping(inner: MemoryProvider) -> Self {
        Self {
            inner,
            mutations: Arc::new(Mutex::new(Vec::new())),
            read_call_count: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(Mutex::new(HashMap::new())),
            fail_reads: Arc::new(AtomicUsize::new(0)),
            capabilities: Capabilities::default(),
        }
    }

    /// Report different capabilities
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Create a new RecordingProvider that shares zones and counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            inner: other.inner.clone(),
            mutations: Arc::clone(&other.mutations),
            read_call_count: Arc::clone(&other.read_call_count),
            failures: Arc::clone(&other.failures),
            fail_reads: Arc::clone(&other.fail_reads),
            capabilities: other.capabilities.clone(),
        }
    }

    /// The backing memory provider
    pub fn memory(&self) -> &MemoryProvider {
        &self.inner
    }

    /// Mutating calls made so far
    pub fn mutations(&self) -> Vec<String> {
        self.mutations.lock().unwrap().clone()
    }

    /// Number of mutating calls made so far
    pub fn mutation_count(&self) -> usize {
        self.mutations.lock().unwrap().len()
    }

    /// Number of read calls made so far
    pub fn read_call_count(&self) -> usize {
        self.read_call_count.load(Ordering::SeqCst)
    }

    /// Make the next `times` calls matching `call` (e.g. "create www.example.com. A") fail
    pub fn fail_next(&self, call: &str, times: usize) {
        self.failures
            .lock()
            .unwrap()
            .insert(call.to_string(), times);
    }

    /// Make every read call fail from now on
    pub fn fail_reads(&self) {
        self.fail_reads.store(1, Ordering::SeqCst);
    }

    fn record(&self, verb: &str, name: &str, record_type: RecordType) -> Result<()> {
        let call = format!("{} {} {}", verb, name, record_type);
        self.mutations.lock().unwrap().push(call.clone());

        let mut failures = self.failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(&call)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(Error::provider("recording", format!("injected failure: {}", call)));
        }
        Ok(())
    }

    fn read(&self) -> Result<()> {
        self.read_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) > 0 {
            return Err(Error::http("connection reset"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DnsProvider for RecordingProvider {
    async fn zone_exists(&self, zone: &str) -> Result<bool> {
        self.read()?;
        self.inner.zone_exists(zone).await
    }

    async fn create_zone(&self, zone: &str) -> Result<()> {
        self.mutations
            .lock()
            .unwrap()
            .push(format!("create_zone {}", zone));
        self.inner.create_zone(zone).await
    }

    async fn list_zone_record_names(&self, zone: &str) -> Result<Vec<RRSetRef>> {
        self.read()?;
        self.inner.list_zone_record_names(zone).await
    }

    async fn get_rrset(&self, zone: &str, name: &str, record_type: RecordType) -> Result<NativeRRSet> {
        self.read()?;
        self.inner.get_rrset(zone, name, record_type).await
    }

    async fn create_rrset(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
        rrset: &NativeRRSet,
    ) -> Result<()> {
        self.record("create", name, record_type)?;
        self.inner.create_rrset(zone, name, record_type, rrset).await
    }

    async fn update_rrset(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
        rrset: &NativeRRSet,
    ) -> Result<()> {
        self.record("update", name, record_type)?;
        self.inner.update_rrset(zone, name, record_type, rrset).await
    }

    async fn delete_rrset(&self, zone: &str, name: &str, record_type: RecordType) -> Result<()> {
        self.record("delete", name, record_type)?;
        self.inner.delete_rrset(zone, name, record_type).await
    }

    async fn get_nameservers(&self, domain: &str) -> Result<Vec<String>> {
        self.inner.get_nameservers(domain).await
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// A single-member native record set
pub fn native(ttl: u32, content: Vec<serde_json::Value>) -> NativeRRSet {
    NativeRRSet {
        ttl,
        resource_records: vec![NativeResourceRecord {
            content,
            enabled: true,
        }],
    }
}

/// Seed an A record set in the observed zone
pub async fn seed_a(provider: &MemoryProvider, name: &str, ip: &str, ttl: u32) {
    provider
        .seed("example.com.", name, RecordType::A, native(ttl, vec![json!(ip)]))
        .await;
}

/// Seed a CNAME record set in the observed zone
pub async fn seed_cname(provider: &MemoryProvider, name: &str, target: &str, ttl: u32) {
    provider
        .seed("example.com.", name, RecordType::Cname, native(ttl, vec![json!(target)]))
        .await;
}

/// Seed an MX record set in the observed zone
pub async fn seed_mx(provider: &MemoryProvider, name: &str, preference: u16, exchange: &str, ttl: u32) {
    provider
        .seed(
            "example.com.",
            name,
            RecordType::Mx,
            native(ttl, vec![json!(preference), json!(exchange)]),
        )
        .await;
}

/// Seed the apex NS record set of the observed zone
pub async fn seed_apex_ns(provider: &MemoryProvider, nameservers: &[&str], ttl: u32) {
    let rrset = NativeRRSet {
        ttl,
        resource_records: nameservers
            .iter()
            .map(|ns| NativeResourceRecord {
                content: vec![json!(ns)],
                enabled: true,
            })
            .collect(),
    };
    provider
        .seed("example.com.", "example.com.", RecordType::Ns, rrset)
        .await;
}

/// Desired A record
pub fn a(name: &str, ip: [u8; 4]) -> RecordConfig {
    RecordConfig::new(name, RecordData::A { address: ip.into() })
}

/// Desired MX record
pub fn mx(name: &str, preference: u16, exchange: &str) -> RecordConfig {
    RecordConfig::new(
        name,
        RecordData::Mx {
            preference,
            exchange: exchange.to_string(),
        },
    )
}

/// Desired NS record
pub fn ns(name: &str, target: &str) -> RecordConfig {
    RecordConfig::new(
        name,
        RecordData::Ns {
            target: target.to_string(),
        },
    )
}

/// Desired CNAME record
pub fn cname(name: &str, target: &str) -> RecordConfig {
    RecordConfig::new(
        name,
        RecordData::Cname {
            target: target.to_string(),
        },
    )
}

/// Desired state of example.com
pub fn example_com(records: Vec<RecordConfig>) -> DomainConfig {
    records
        .into_iter()
        .fold(DomainConfig::new("example.com"), DomainConfig::with_record)
}

/// Engine settings for tests: no retry delay
pub fn engine_config() -> EngineConfig {
    EngineConfig {
        retry_delay_secs: 0,
        ..EngineConfig::default()
    }
}
