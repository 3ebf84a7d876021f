// # Record Model
//
// Canonical in-memory representation of one DNS resource record,
// independent of any provider's wire format.
//
// Records are immutable once built: every constructor canonicalises the
// owner name, the zone and any hostname embedded in the record data, so two
// records that mean the same thing always compare equal.

use crate::error::{Error, Result};
use crate::model::name::fqdn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Certification authority authorization
    Caa,
    /// Canonical name (alias)
    Cname,
    /// Mail exchange
    Mx,
    /// Delegated name server
    Ns,
    /// Service locator
    Srv,
    /// Text
    Txt,
}

impl RecordType {
    /// Every record type the core models
    pub const ALL: [RecordType; 8] = [
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Caa,
        RecordType::Cname,
        RecordType::Mx,
        RecordType::Ns,
        RecordType::Srv,
        RecordType::Txt,
    ];

    /// Presentation name (upper case)
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Caa => "CAA",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Srv => "SRV",
            RecordType::Txt => "TXT",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    /// Unknown types are an error, never silently dropped: skipping a type
    /// would make a zone look in sync when it is not.
    fn from_str(s: &str) -> Result<Self> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::unsupported(format!("record type '{}' is not supported", s)))
    }
}

/// Type-specific record data
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum RecordData {
    /// A record
    A {
        /// IPv4 address
        address: Ipv4Addr,
    },
    /// AAAA record
    Aaaa {
        /// IPv6 address
        address: Ipv6Addr,
    },
    /// CAA record
    Caa {
        /// Flags octet (0 or 128 in practice)
        flags: u8,
        /// Property tag (issue, issuewild, iodef)
        tag: String,
        /// Property value
        value: String,
    },
    /// CNAME record
    Cname {
        /// Alias target
        target: String,
    },
    /// MX record
    Mx {
        /// Preference (lower wins)
        preference: u16,
        /// Mail exchanger host
        exchange: String,
    },
    /// NS record
    Ns {
        /// Name server host
        target: String,
    },
    /// SRV record
    Srv {
        /// Priority (lower wins)
        priority: u16,
        /// Relative weight within a priority
        weight: u16,
        /// Service port
        port: u16,
        /// Target host (`.` means "service not available")
        target: String,
    },
    /// TXT record
    Txt {
        /// Character strings, in order
        strings: Vec<String>,
    },
}

impl RecordData {
    /// The record type this data belongs to
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordData::A { .. } => RecordType::A,
            RecordData::Aaaa { .. } => RecordType::Aaaa,
            RecordData::Caa { .. } => RecordType::Caa,
            RecordData::Cname { .. } => RecordType::Cname,
            RecordData::Mx { .. } => RecordType::Mx,
            RecordData::Ns { .. } => RecordType::Ns,
            RecordData::Srv { .. } => RecordType::Srv,
            RecordData::Txt { .. } => RecordType::Txt,
        }
    }

    /// Canonical form: hostnames lower-cased and absolute, CAA tags lower-cased
    fn canonical(self) -> Self {
        match self {
            RecordData::Cname { target } => RecordData::Cname {
                target: fqdn(&target),
            },
            RecordData::Ns { target } => RecordData::Ns {
                target: fqdn(&target),
            },
            RecordData::Mx {
                preference,
                exchange,
            } => RecordData::Mx {
                preference,
                exchange: fqdn(&exchange),
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
                target: fqdn(&target),
            },
            RecordData::Caa { flags, tag, value } => RecordData::Caa {
                flags,
                tag: tag.to_ascii_lowercase(),
                value,
            },
            other => other,
        }
    }
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::A { address } => write!(f, "{}", address),
            RecordData::Aaaa { address } => write!(f, "{}", address),
            RecordData::Caa { flags, tag, value } => {
                write!(f, "{} {} {}", flags, tag, quoted(value))
            }
            RecordData::Cname { target } | RecordData::Ns { target } => f.write_str(target),
            RecordData::Mx {
                preference,
                exchange,
            } => write!(f, "{} {}", preference, exchange),
            RecordData::Srv {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{} {} {} {}", priority, weight, port, target),
            RecordData::Txt { strings } => {
                let parts: Vec<String> = strings.iter().map(|s| quoted(s)).collect();
                f.write_str(&parts.join(" "))
            }
        }
    }
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Identity key of a record set: (fully-qualified name, type)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    /// Canonical owner name
    pub name: String,
    /// Record type
    pub record_type: RecordType,
}

impl Label {
    /// Create a label, canonicalising the name
    pub fn new(name: &str, record_type: RecordType) -> Self {
        Self {
            name: fqdn(name),
            record_type,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.record_type)
    }
}

/// One DNS resource record
///
/// Ordering is by zone, name, TTL, then data, which keeps the members of a
/// label group in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Record {
    zone: String,
    name: String,
    ttl: u32,
    data: RecordData,
}

impl Record {
    /// Build a record; names and hostname targets are canonicalised
    pub fn new(zone: &str, name: &str, ttl: u32, data: RecordData) -> Self {
        Self {
            zone: fqdn(zone),
            name: fqdn(name),
            ttl,
            data: data.canonical(),
        }
    }

    /// Owning zone (canonical)
    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Owner name (canonical)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time-to-live in seconds
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Type-specific data
    pub fn data(&self) -> &RecordData {
        &self.data
    }

    /// Record type
    pub fn record_type(&self) -> RecordType {
        self.data.record_type()
    }

    /// The label this record is grouped under
    pub fn label(&self) -> Label {
        Label {
            name: self.name.clone(),
            record_type: self.record_type(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.name,
            self.ttl,
            self.record_type(),
            self.data
        )
    }
}
