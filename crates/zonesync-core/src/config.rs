//! Configuration types for zone reconciliation
//!
//! This module defines all configuration structures used throughout the crate.
//! Desired zone contents ([`DomainConfig`]) are plain serde data; they are
//! usually loaded from a JSON file with [`ZonesyncConfig::from_json_file`].

use crate::model::{Record, RecordData, qualify};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZonesyncConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Zones to manage
    pub domains: Vec<DomainConfig>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ZonesyncConfig {
    /// Create a new configuration with defaults
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            domains: Vec::new(),
            engine: EngineConfig::default(),
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domains.is_empty() {
            return Err(crate::Error::config("No domains configured"));
        }

        self.provider.validate()?;
        self.engine.validate()?;

        let mut seen = std::collections::BTreeSet::new();
        for domain in &self.domains {
            domain.validate()?;
            if !seen.insert(domain.zone()) {
                return Err(crate::Error::config(format!(
                    "Domain {} is configured more than once",
                    domain.name
                )));
            }
        }

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// G-Core DNS API
    Gcore {
        /// G-Core permanent API key (may be supplied by the environment instead)
        #[serde(default)]
        api_key: String,
        /// API base URL override
        #[serde(default)]
        api_url: Option<String>,
    },

    /// In-memory provider (tests, previews, embedding)
    Memory {
        /// Nameservers reported for every domain
        #[serde(default)]
        nameservers: Vec<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Gcore { api_key, api_url } => {
                if api_key.is_empty() {
                    return Err(crate::Error::config("G-Core API key cannot be empty"));
                }
                if let Some(url) = api_url
                    && !url.starts_with("https://")
                    && !url.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "G-Core API URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                Ok(())
            }
            ProviderConfig::Memory { .. } => Ok(()),
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Gcore { .. } => "gcore",
            ProviderConfig::Memory { .. } => "memory",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Desired state of one zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Zone name (e.g., "example.com")
    pub name: String,

    /// Desired records
    #[serde(default)]
    pub records: Vec<RecordConfig>,
}

impl DomainConfig {
    /// Create an empty domain configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
        }
    }

    /// Add a desired record
    pub fn with_record(mut self, record: RecordConfig) -> Self {
        self.records.push(record);
        self
    }

    /// Canonical zone name
    pub fn zone(&self) -> String {
        crate::model::fqdn(&self.name)
    }

    /// Desired records in canonical form
    ///
    /// Owner names and hostname targets are qualified against the zone.
    pub fn desired_records(&self) -> Vec<Record> {
        self.records
            .iter()
            .map(|r| {
                Record::new(
                    &self.name,
                    &qualify(&r.name, &self.name),
                    r.ttl,
                    qualify_targets(r.data.clone(), &self.name),
                )
            })
            .collect()
    }

    /// Validate the domain configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_name(&self.name)?;
        if self.zone() == "." {
            return Err(crate::Error::config("Domain name cannot be the root"));
        }

        for record in &self.records {
            if record.name != "@" {
                validate_name(&record.name)?;
            }
            if record.ttl == 0 {
                return Err(crate::Error::config(format!(
                    "{}: TTL must be > 0",
                    record.name
                )));
            }
            if let RecordData::Txt { strings } = &record.data
                && strings.is_empty()
            {
                return Err(crate::Error::config(format!(
                    "{}: TXT record needs at least one string",
                    record.name
                )));
            }
            let owner = qualify(&record.name, &self.name);
            if !crate::model::name::in_zone(&owner, &self.name) {
                return Err(crate::Error::config(format!(
                    "{} is outside zone {}",
                    owner, self.name
                )));
            }
        }

        Ok(())
    }
}

/// Qualify relative hostnames in record data; `.` (null SRV target) is kept
fn qualify_targets(data: RecordData, zone: &str) -> RecordData {
    match data {
        RecordData::Cname { target } => RecordData::Cname {
            target: qualify(&target, zone),
        },
        RecordData::Ns { target } => RecordData::Ns {
            target: qualify(&target, zone),
        },
        RecordData::Mx {
            preference,
            exchange,
        } => RecordData::Mx {
            preference,
            exchange: qualify(&exchange, zone),
        },
        RecordData::Srv {
            priority,
            weight,
            port,
            target,
        } => RecordData::Srv {
            priority,
            weight,
            port,
            target: qualify(&target, zone),
        },
        other => other,
    }
}

/// Names must already be ASCII (punycode) presentation form
fn validate_name(name: &str) -> Result<(), crate::Error> {
    if name.len() > 253 {
        return Err(crate::Error::config(format!(
            "Name too long: {} chars (max 253). Got: {}",
            name.len(),
            name
        )));
    }
    if !name.is_ascii() {
        return Err(crate::Error::config(format!(
            "Name must be ASCII (use punycode for internationalized names): {}",
            name
        )));
    }
    for label in name.trim_end_matches('.').split('.') {
        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }
    }
    Ok(())
}

/// One desired DNS record
///
/// ```json
/// { "name": "mail", "ttl": 300, "type": "MX", "preference": 10, "exchange": "mx1.example.com." }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Owner name: `@`, a name relative to the zone, or an absolute name ending in `.`
    pub name: String,

    /// Time-to-live in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Type-specific data (tagged by `type`)
    ///
    /// Hostname targets follow the owner-name rules: without a trailing dot
    /// they are relative to the zone.
    #[serde(flatten)]
    pub data: RecordData,
}

impl RecordConfig {
    /// Create a new record configuration with the default TTL
    pub fn new(name: impl Into<String>, data: RecordData) -> Self {
        Self {
            name: name.into(),
            ttl: default_ttl(),
            data,
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }
}

fn default_ttl() -> u32 {
    300
}

/// What the reconciler does after a correction fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failure; later corrections may depend on it
    #[default]
    FailFast,
    /// Record the failure and keep going, in order
    Continue,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Extra attempts for a failed correction before it counts as failed
    ///
    /// Retries re-run only the failed correction, before anything after it.
    #[serde(default)]
    pub max_retries: usize,

    /// Delay between retry attempts (in seconds)
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// What to do after a correction fails
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Corrections of the same pass allowed in flight at once
    ///
    /// 1 applies strictly one correction at a time. Passes never overlap.
    #[serde(default = "default_max_parallel_per_pass")]
    pub max_parallel_per_pass: usize,

    /// Create zones the provider does not host yet
    #[serde(default = "default_create_missing_zones")]
    pub create_missing_zones: bool,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_parallel_per_pass == 0 {
            return Err(crate::Error::config("max_parallel_per_pass must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_delay_secs: default_retry_delay_secs(),
            failure_policy: FailurePolicy::default(),
            max_parallel_per_pass: default_max_parallel_per_pass(),
            create_missing_zones: default_create_missing_zones(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_retry_delay_secs() -> u64 {
    1
}

fn default_max_parallel_per_pass() -> usize {
    1
}

fn default_create_missing_zones() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    1000
}
