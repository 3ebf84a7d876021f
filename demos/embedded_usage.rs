//! Minimal embedding example for zonesync-core
//!
//! Uses zonesync-core as a library: a custom provider wraps the in-memory
//! one, the application previews the plan, applies it, and checks that a
//! second plan is empty.

use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use zonesync_core::model::NativeResourceRecord;
use zonesync_core::traits::{DnsProvider, RRSetRef};
use zonesync_core::{
    DomainConfig, EngineConfig, MemoryProvider, NativeRRSet, Reconciler, RecordConfig, RecordData,
    RecordType, Result,
};

/// Custom provider that counts the writes it forwards
struct CountingProvider {
    inner: MemoryProvider,
    writes: Arc<AtomicUsize>,
}

impl CountingProvider {
    fn count(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl DnsProvider for CountingProvider {
    async fn zone_exists(&self, zone: &str) -> Result<bool> {
        self.inner.zone_exists(zone).await
    }

    async fn create_zone(&self, zone: &str) -> Result<()> {
        self.count();
        self.inner.create_zone(zone).await
    }

    async fn list_zone_record_names(&self, zone: &str) -> Result<Vec<RRSetRef>> {
        self.inner.list_zone_record_names(zone).await
    }

    async fn get_rrset(&self, zone: &str, name: &str, record_type: RecordType) -> Result<NativeRRSet> {
        self.inner.get_rrset(zone, name, record_type).await
    }

    async fn create_rrset(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
        rrset: &NativeRRSet,
    ) -> Result<()> {
        self.count();
        println!("[Embedded] create {} {}", name, record_type);
        self.inner.create_rrset(zone, name, record_type, rrset).await
    }

    async fn update_rrset(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
        rrset: &NativeRRSet,
    ) -> Result<()> {
        self.count();
        println!("[Embedded] update {} {}", name, record_type);
        self.inner.update_rrset(zone, name, record_type, rrset).await
    }

    async fn delete_rrset(&self, zone: &str, name: &str, record_type: RecordType) -> Result<()> {
        self.count();
        println!("[Embedded] delete {} {}", name, record_type);
        self.inner.delete_rrset(zone, name, record_type).await
    }

    async fn get_nameservers(&self, domain: &str) -> Result<Vec<String>> {
        self.inner.get_nameservers(domain).await
    }

    fn provider_name(&self) -> &'static str {
        "embedded"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::WARN).init();
    println!("=== Embedded zonesync-core Example ===\n");

    // Observed state: www is a CNAME that must become an A record
    let memory = MemoryProvider::new();
    memory
        .seed(
            "example.com.",
            "www.example.com.",
            RecordType::Cname,
            NativeRRSet {
                ttl: 300,
                resource_records: vec![NativeResourceRecord {
                    content: vec![json!("old.example.com")],
                    enabled: true,
                }],
            },
        )
        .await;

    let writes = Arc::new(AtomicUsize::new(0));
    let provider = CountingProvider {
        inner: memory.clone(),
        writes: Arc::clone(&writes),
    };

    let domain = DomainConfig::new("example.com")
        .with_record(RecordConfig::new(
            "www",
            RecordData::A {
                address: [192, 0, 2, 10].into(),
            },
        ))
        .with_record(
            RecordConfig::new(
                "@",
                RecordData::Mx {
                    preference: 10,
                    exchange: "mx1.example.com.".to_string(),
                },
            )
            .with_ttl(3600),
        );

    println!("1. Creating reconciler...");
    let (reconciler, mut event_rx) = Reconciler::new(Box::new(provider), EngineConfig::default())?;

    let event_listener = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            println!("[Event] {:?}", event);
        }
    });

    println!("2. Previewing...");
    for (i, correction) in reconciler.plan(&domain).await?.iter().enumerate() {
        println!("   #{}: {}", i + 1, correction.msg);
    }

    println!("3. Pushing...");
    let report = reconciler.reconcile(&domain).await?.into_result()?;
    println!(
        "   applied {} correction(s) with {} provider write(s)",
        report.applied,
        writes.load(Ordering::SeqCst)
    );

    println!("4. Re-planning...");
    let again = reconciler.plan(&domain).await?;
    println!("   {} correction(s) left", again.len());

    drop(reconciler);
    let _ = event_listener.await;

    println!("\n=== Embedding Successful ===");
    Ok(())
}
